//! Log follower that reports discovered sub-job ids
//!
//! Actions that launch Hadoop work print lines like
//! `INFO mapreduce.Job: Running job: job_1575312820089_0001` to their log
//! file. The observer tails that file and reports each new id as a
//! `hadoop-job-id` event so the orchestrator can track the sub-job.

use crate::ActionEventReporter;
use action_events::EVENT_TYPE_HADOOP_JOB_ID;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Marker preceding a sub-job id in action log output.
const JOB_ID_MARKER: &str = "Running job: ";

/// Only ids with this prefix are real sub-job ids.
const JOB_ID_PREFIX: &str = "job_";

pub struct LogObserver {
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LogObserver {
    /// Follow `path`, reporting each new sub-job id found in it. The file
    /// does not have to exist yet; the observer polls until it appears
    /// and keeps reading as the file grows.
    pub fn spawn(
        path: impl Into<PathBuf>,
        reporter: Arc<ActionEventReporter>,
        poll_interval: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(follow_log(path.into(), reporter, poll_interval, stop_rx));
        Self { stop_tx, task: Mutex::new(Some(task)) }
    }

    /// Stop following and wait for the tail task to exit. Idempotent.
    /// Does not finish the reporter; the caller owns that.
    pub async fn finish(&self) {
        let _ = self.stop_tx.send(true);
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "log observer task failed");
            }
        }
    }
}

async fn follow_log(
    path: PathBuf,
    reporter: Arc<ActionEventReporter>,
    poll_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!(path = %path.display(), "log observer started");
    let Some(file) = wait_for_file(&path, poll_interval, &mut stop_rx).await else {
        info!("log observer stopped before the log file appeared");
        return;
    };

    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let mut seen = HashSet::new();
    loop {
        if *stop_rx.borrow() {
            break;
        }
        line.clear();
        match reader.read_line(&mut line).await {
            // at EOF; the file may still be growing
            Ok(0) => {
                if wait_or_stop(poll_interval, &mut stop_rx).await {
                    break;
                }
            }
            Ok(_) => {
                if let Some(job_id) = extract_job_id(&line) {
                    if seen.insert(job_id.to_string()) {
                        debug!(job_id, "discovered sub-job id");
                        reporter.report(
                            reporter
                                .new_event()
                                .with_type(EVENT_TYPE_HADOOP_JOB_ID)
                                .with_message(job_id),
                        );
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "log observer read failed");
                if wait_or_stop(poll_interval, &mut stop_rx).await {
                    break;
                }
            }
        }
    }
    info!("log observer stopped");
}

async fn wait_for_file(
    path: &Path,
    poll_interval: Duration,
    stop_rx: &mut watch::Receiver<bool>,
) -> Option<File> {
    loop {
        if *stop_rx.borrow() {
            return None;
        }
        match File::open(path).await {
            Ok(file) => return Some(file),
            Err(_) => {
                if wait_or_stop(poll_interval, stop_rx).await {
                    return None;
                }
            }
        }
    }
}

/// Sleep one poll interval; true when stop was requested meanwhile.
async fn wait_or_stop(poll_interval: Duration, stop_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(poll_interval) => false,
        changed = stop_rx.changed() => changed.is_err() || *stop_rx.borrow(),
    }
}

/// Extract a sub-job id from one log line: the trimmed remainder after
/// the marker, accepted only when it looks like a job id.
fn extract_job_id(line: &str) -> Option<&str> {
    let start = line.find(JOB_ID_MARKER)? + JOB_ID_MARKER.len();
    let id = line[start..].trim();
    if id.starts_with(JOB_ID_PREFIX) {
        Some(id)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReporterConfig;
    use crate::transport::testing::RecordingTransport;
    use std::io::Write;

    #[test]
    fn extracts_only_prefixed_job_ids() {
        assert_eq!(
            extract_job_id("INFO mapreduce.Job: Running job: job_1575312820089_0001\n"),
            Some("job_1575312820089_0001")
        );
        assert_eq!(extract_job_id("Running job: job_42"), Some("job_42"));
        assert_eq!(extract_job_id("Running job: application_42"), None);
        assert_eq!(extract_job_id("no marker here"), None);
        assert_eq!(extract_job_id("Running job:   \n"), None);
    }

    async fn wait_for_pending(reporter: &ActionEventReporter, expected: usize) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while reporter.pending() < expected {
            assert!(
                std::time::Instant::now() < deadline,
                "observer never reported {expected} events"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn tails_a_growing_log_and_reports_each_id_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action.log");

        let transport = RecordingTransport::accepting();
        let reporter = Arc::new(ActionEventReporter::with_transport(
            ReporterConfig::new("job-1-W@pig"),
            transport.clone(),
        ));

        // spawned before the file exists
        let observer = LogObserver::spawn(&path, reporter.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "INFO launcher: starting").unwrap();
        writeln!(file, "INFO mapreduce.Job: Running job: job_100_0001").unwrap();
        file.flush().unwrap();
        wait_for_pending(&reporter, 1).await;

        // growth after the first EOF, including a duplicate to ignore
        writeln!(file, "INFO mapreduce.Job: Running job: job_100_0001").unwrap();
        writeln!(file, "INFO mapreduce.Job: Running job: job_100_0002").unwrap();
        file.flush().unwrap();
        wait_for_pending(&reporter, 2).await;

        observer.finish().await;
        reporter.finish().await;

        let bodies = transport.bodies();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("job_100_0001"));
        assert!(bodies[0].contains("job_100_0002"));
        assert!(bodies[0].contains(EVENT_TYPE_HADOOP_JOB_ID));
    }

    #[tokio::test]
    async fn finish_before_the_file_appears_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created.log");

        let transport = RecordingTransport::accepting();
        let reporter = Arc::new(ActionEventReporter::with_transport(
            ReporterConfig::new("job-1-W@pig"),
            transport.clone(),
        ));

        let observer = LogObserver::spawn(&path, reporter.clone(), Duration::from_millis(10));
        observer.finish().await;
        observer.finish().await; // idempotent
        reporter.finish().await;

        assert!(transport.bodies().is_empty());
    }
}
