// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTTP binding of the synchronizer: one `POST /sync` route.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use mirror_protocol::wire::is_json_content_type;
use mirror_session::{RequestSynchronizer, ResponseSink, SyncError};
use tracing::{error, warn};

/// Header carrying the host session id.
pub const SESSION_HEADER: &str = "x-mirror-session";
/// Cookie consulted when [`SESSION_HEADER`] is absent.
pub const SESSION_COOKIE: &str = "mirror_session";

/// Router serving the sync endpoint.
pub fn router(sync: Arc<RequestSynchronizer>) -> Router {
    Router::new()
        .route("/sync", post(sync_handler))
        .with_state(sync)
}

async fn sync_handler(
    State(sync): State<Arc<RequestSynchronizer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !is_json_content_type(content_type) {
        warn!(content_type, "rejecting non-json request");
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }
    let Some(host) = host_id(&headers) else {
        warn!("request without session id");
        return (StatusCode::BAD_REQUEST, "missing session id").into_response();
    };

    let mut captured = Captured::default();
    match sync.service(&host, &body, &mut captured).await {
        Ok(()) => captured.into_response(),
        Err(SyncError::Decode(err)) => {
            warn!(host = %host, error = %err, "malformed request");
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(err) => {
            error!(host = %host, error = ?err, "request failed; ui session shut down");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn host_id(headers: &HeaderMap) -> Option<String> {
    if let Some(id) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        return Some(id.to_owned());
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

/// Holds the single response the synchronizer writes.
#[derive(Debug, Default)]
struct Captured(Option<mirror_session::Response>);

impl ResponseSink for Captured {
    fn write(&mut self, response: &mirror_session::Response) -> std::io::Result<()> {
        self.0 = Some(response.clone());
        Ok(())
    }
}

impl IntoResponse for Captured {
    fn into_response(self) -> Response {
        let Some(response) = self.0 else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let status =
            StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, response.content_type())],
            response.body,
        )
            .into_response()
    }
}
