//! End-to-end tests over a running service
//!
//! Each test boots the full wiring on an ephemeral port, drives it from
//! the producer side, and inspects the in-memory store after shutdown.

use crate::config::ServiceConfig;
use crate::service::ServiceState;
use event_reporter::{ActionEventReporter, LogObserver, ReporterConfig};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Memory-backed config bound to an ephemeral localhost port.
fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.host = "127.0.0.1".to_string();
    config.listener.port = 0;
    config
}

#[tokio::test]
async fn reported_events_reach_the_store() {
    let state = ServiceState::new(test_config()).await.expect("memory-backed state builds");
    let addr = state.start_listener().await.expect("listener binds");

    let reporter = ActionEventReporter::new(
        ReporterConfig::new("job-7-W@collect")
            .with_callback_url(format!("http://{addr}/callback/events")),
    )
    .expect("reporter builds");

    assert!(reporter.report(reporter.new_event().with_message("action started")));
    assert!(reporter.report(
        reporter
            .new_event()
            .with_type("hadoop-job-id")
            .with_message("job_1575312820089_0001")
    ));
    assert!(reporter.report(reporter.new_event().with_message("action finished")));

    // finish flushes the queue; shutdown drains the command queue
    reporter.finish().await;
    state.shutdown().await;

    let store = state.store();
    assert_eq!(store.count_events_for_action("job-7-W@collect").await.unwrap(), 3);
    let events = store.events_for_action("job-7-W@collect").await.unwrap();
    assert!(events
        .iter()
        .any(|event| event.message.as_deref() == Some("job_1575312820089_0001")));
    assert!(events.iter().all(|event| event.action_id.as_deref() == Some("job-7-W@collect")));
}

#[tokio::test]
async fn wrong_content_type_is_rejected_without_store_writes() {
    let state = ServiceState::new(test_config()).await.expect("memory-backed state builds");
    let addr = state.start_listener().await.expect("listener binds");

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/callback/events"))
        .header("content-type", "text/plain")
        .body("[]")
        .send()
        .await
        .expect("request reaches the listener");
    assert_eq!(response.status(), reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);

    state.shutdown().await;
    assert!(state.store().all_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_reporter_never_contacts_the_listener() {
    let state = ServiceState::new(test_config()).await.expect("memory-backed state builds");
    state.start_listener().await.expect("listener binds");

    // no callback URL, so the pipeline is disabled
    let reporter =
        ActionEventReporter::new(ReporterConfig::new("job-2-W@shell")).expect("builds");
    assert!(!reporter.report(reporter.new_event().with_message("dropped")));
    assert!(!reporter.report(reporter.new_event().with_message("also dropped")));

    reporter.finish().await;
    state.shutdown().await;
    assert!(state.store().all_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn log_observer_feeds_job_ids_through_to_the_store() {
    let state = ServiceState::new(test_config()).await.expect("memory-backed state builds");
    let addr = state.start_listener().await.expect("listener binds");

    // long interval keeps the periodic cycle out of the test; the
    // terminal flush on finish delivers everything
    let reporter = Arc::new(
        ActionEventReporter::new(
            ReporterConfig::new("job-3-W@pig")
                .with_callback_url(format!("http://{addr}/callback/events"))
                .with_send_interval(600),
        )
        .expect("reporter builds"),
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("action.log");
    let observer = LogObserver::spawn(&path, reporter.clone(), Duration::from_millis(10));

    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "INFO mapreduce.Job: Running job: job_1575312820089_0001").unwrap();
    file.flush().unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while reporter.pending() == 0 {
        assert!(std::time::Instant::now() < deadline, "observer never reported the job id");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    observer.finish().await;
    reporter.finish().await;
    state.shutdown().await;

    let events = state.store().events_for_action("job-3-W@pig").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type.as_deref(), Some("hadoop-job-id"));
    assert_eq!(events[0].message.as_deref(), Some("job_1575312820089_0001"));
}
