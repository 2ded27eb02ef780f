//! Request identification.
//!
//! Every request gets an `x-request-id` as early as possible so proxy
//! logs, backend logs, and probe noise can be correlated. Incoming IDs
//! from trusted callers are preserved; missing ones are minted.

use axum::http::HeaderValue;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the correlation ID end to end.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Mints a UUID v4 per request for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
