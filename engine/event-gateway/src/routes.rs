//! Warp routes for the event callback listener

use crate::config::ListenerConfig;
use crate::engine::OrchestratorEngine;
use crate::error::GatewayError;
use action_events::codec;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::Filter;

/// Build the callback routes. `POST /callback/events` accepts wire
/// batches; everything else falls through to warp's default rejections.
pub fn create_routes(
    engine: Arc<dyn OrchestratorEngine>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let engine = warp::any().map(move || engine.clone());

    warp::path!("callback" / "events")
        .and(warp::post())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::bytes())
        .and(engine)
        .and_then(handle_event_batch)
}

async fn handle_event_batch(
    content_type: Option<String>,
    body: Bytes,
    engine: Arc<dyn OrchestratorEngine>,
) -> Result<impl warp::Reply, warp::Rejection> {
    // The body is untouched unless the declared type is JSON.
    if !is_json_content_type(content_type.as_deref()) {
        warn!(content_type = ?content_type, "rejecting event batch with unsupported media type");
        return Ok(reply(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "content type must be application/json",
        ));
    }

    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(_) => {
            warn!("rejecting event batch with a non-utf8 body");
            return Ok(reply(StatusCode::BAD_REQUEST, "body must be utf-8 json"));
        }
    };

    let events = match codec::decode_batch(text) {
        Ok(events) => events,
        Err(err) => {
            warn!(error = %err, "rejecting undecodable event batch");
            return Ok(reply(StatusCode::BAD_REQUEST, "body must be a json array of events"));
        }
    };

    if events.is_empty() {
        return Ok(reply(StatusCode::OK, ""));
    }

    let action_id =
        events.iter().find_map(|event| event.action_id.as_deref()).unwrap_or("").to_string();
    debug!(action_id = %action_id, events = events.len(), "received event batch");

    match engine.submit_event_batch(&action_id, events).await {
        Ok(()) => Ok(reply(StatusCode::OK, "")),
        Err(err) => {
            warn!(error = %err, "engine rejected event batch");
            Ok(reply(StatusCode::INTERNAL_SERVER_ERROR, "failed to accept event batch"))
        }
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    matches!(content_type, Some(value) if value.starts_with("application/json"))
}

fn reply(status: StatusCode, message: &'static str) -> warp::reply::WithStatus<&'static str> {
    warp::reply::with_status(message, status)
}

/// Bind the listener with graceful shutdown. Returns the bound address
/// and the serve future; the future completes once `shutdown` fires and
/// in-flight requests finish.
pub fn bind(
    config: &ListenerConfig,
    engine: Arc<dyn OrchestratorEngine>,
    shutdown: tokio::sync::oneshot::Receiver<()>,
) -> Result<(SocketAddr, impl Future<Output = ()>), GatewayError> {
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|_| GatewayError::InvalidAddress(config.server_addr()))?;

    let routes = create_routes(engine);
    warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = shutdown.await;
        })
        .map_err(|err| GatewayError::Server(err.to_string()))
}
