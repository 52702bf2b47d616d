//! Stand-in authentication.
//!
//! Trusts the `X-User-Id` and `X-User-Type` headers set by the gateway and
//! turns them into an [`Actor`] request extension. Requests without a user
//! id proceed anonymously and are not audited.

use auditlog_capture::interceptor::Actor;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_TYPE_HEADER: &str = "x-user-type";

const DEFAULT_USER_TYPE: &str = "user";

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Axum middleware that attaches the caller's [`Actor`].
pub async fn actor_from_headers(mut request: Request, next: Next) -> Response {
    if let Some(user_id) = header_value(&request, USER_ID_HEADER) {
        let user_type = header_value(&request, USER_TYPE_HEADER)
            .unwrap_or_else(|| DEFAULT_USER_TYPE.to_owned());
        request.extensions_mut().insert(Actor { user_id, user_type });
    }
    next.run(request).await
}
