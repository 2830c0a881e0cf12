use super::AppState;
use crate::model::account::Principal;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Header carrying the authenticated user, set by the reverse proxy.
pub const PRINCIPAL_HEADER: &str = "x-forwarded-user";

/// Methods subject to the generic filter. Matches close to every request
/// on purpose, narrowing this list is a policy decision.
const FILTERED_METHODS: &[Method] = &[Method::POST, Method::GET, Method::PUT, Method::DELETE];

pub fn principal(headers: &HeaderMap) -> Principal {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(Principal::identified)
        .unwrap_or(Principal::Anonymous)
}

/// Answer 503 with the configured message before the route is reached
/// when the acting principal is blocked.
pub async fn block_writes(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if FILTERED_METHODS.contains(request.method()) {
        let principal = principal(request.headers());
        match state.gate.is_blocked(&principal).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::debug!("rejecting {} {}", request.method(), request.uri());
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    state.gate.message().to_string(),
                )
                    .into_response();
            }
            Err(error) => {
                tracing::error!("unable to evaluate block status: {error}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "unable to evaluate block status",
                )
                    .into_response();
            }
        }
    }
    next.run(request).await
}
