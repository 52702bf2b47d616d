//! Change interceptor: axum middleware that audits entity mutations.
//!
//! Wrap the mutating routes of one entity type with
//! `axum::middleware::from_fn_with_state(interceptor, audit_mutations)`.
//! For each request the middleware:
//!
//! 1. maps the method to an action (`POST` create, `PUT`/`PATCH` update,
//!    `DELETE` delete; anything else passes straight through),
//! 2. requires an [`Actor`] request extension from upstream auth middleware,
//! 3. buffers the JSON payload and forwards an identical request,
//! 4. on a 2xx response, diffs the payload against the [`BeforeImage`] and
//!    hands the event to the dispatcher,
//! 5. returns the handler's response unchanged.
//!
//! Bodies larger than [`MAX_BUFFERED_BODY`] are streamed through untouched
//! and the mutation goes unaudited.

use std::net::SocketAddr;
use std::sync::Arc;

use auditlog_core::event::{AuditAction, NewAuditEvent};
use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, FromRequestParts, OriginalUri, RawPathParams, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use futures_util::{Stream, StreamExt, stream};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::diff::{DiffPolicy, compute_changes};
use crate::dispatcher::AuditDispatcher;

/// Largest request or response body the interceptor will buffer.
pub const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// Identity of the user performing a request, inserted into the request
/// extensions by authentication middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Stable user identifier.
    pub user_id: String,
    /// Role of the user (e.g. `admin`, `sales_rep`).
    pub user_type: String,
}

/// Snapshot of an entity before an update or delete.
///
/// Attach it to the request extensions before the wrapped handler runs, or
/// to the handler's response extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct BeforeImage(pub Value);

/// Per-entity-type interceptor configuration, used as middleware state.
#[derive(Debug, Clone)]
pub struct AuditInterceptor {
    dispatcher: AuditDispatcher,
    entity_type: Arc<str>,
    service_name: Arc<str>,
    policy: DiffPolicy,
}

impl AuditInterceptor {
    /// Creates an interceptor that tags events with `entity_type`.
    #[must_use]
    pub fn new(dispatcher: AuditDispatcher, entity_type: &str) -> Self {
        Self {
            dispatcher,
            entity_type: Arc::from(entity_type),
            service_name: Arc::from("unknown"),
            policy: DiffPolicy::default(),
        }
    }

    /// Sets the service name recorded in event metadata.
    #[must_use]
    pub fn with_service_name(mut self, service_name: &str) -> Self {
        self.service_name = Arc::from(service_name);
        self
    }

    /// Sets the diff policy.
    #[must_use]
    pub fn with_policy(mut self, policy: DiffPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Maps an HTTP method to the audit action it performs.
#[must_use]
pub fn action_for(method: &Method) -> Option<AuditAction> {
    match *method {
        Method::POST => Some(AuditAction::Create),
        Method::PUT | Method::PATCH => Some(AuditAction::Update),
        Method::DELETE => Some(AuditAction::Delete),
        _ => None,
    }
}

/// Request facts captured before the handler consumes the request.
#[derive(Debug)]
struct RequestContext {
    method: Method,
    path: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    before: Option<BeforeImage>,
    /// Path parameters of the matched route, in declaration order.
    path_params: Vec<(String, String)>,
}

impl RequestContext {
    fn from_parts(parts: &Parts, path_params: Vec<(String, String)>) -> Self {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |original| original.0.path())
            .to_owned();
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        });
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Self {
            method: parts.method.clone(),
            path,
            ip_address,
            user_agent,
            before: parts.extensions.get::<BeforeImage>().cloned(),
            path_params,
        }
    }

    /// Identifier of the entity addressed by the route: the `id` parameter,
    /// else the last parameter, else the last path segment.
    fn path_entity_id(&self) -> Option<String> {
        if let Some((_, id)) = self.path_params.iter().find(|(name, _)| name == "id") {
            return Some(id.clone());
        }
        if let Some((_, value)) = self.path_params.last() {
            return Some(value.clone());
        }
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(str::to_owned)
    }
}

/// Percent-decoded parameters of the matched route; empty when the route
/// has none.
async fn matched_path_params(parts: &mut Parts) -> Vec<(String, String)> {
    RawPathParams::from_request_parts(parts, &())
        .await
        .map(|params| {
            params
                .iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect()
        })
        .unwrap_or_default()
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn exceeds_buffer(headers: &HeaderMap) -> bool {
    declared_length(headers).is_some_and(|len| len > MAX_BUFFERED_BODY)
}

/// Result of reading a body up to a limit.
enum Buffered {
    /// The complete body.
    Complete(Bytes),
    /// The body was over the limit or failed mid-read. Replays the bytes
    /// already read, then the remainder of the original stream.
    Passthrough(Body),
}

async fn buffer_bounded(body: Body, limit: usize) -> Buffered {
    let mut chunks = body.into_data_stream();
    let mut buffered = Vec::new();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(chunk) => {
                buffered.extend_from_slice(&chunk);
                if buffered.len() > limit {
                    return Buffered::Passthrough(replay(buffered, chunks));
                }
            }
            Err(err) => {
                warn!(error = %err, "body failed while buffering for audit");
                return Buffered::Passthrough(replay(
                    buffered,
                    stream::once(async move { Err(err) }),
                ));
            }
        }
    }
    Buffered::Complete(Bytes::from(buffered))
}

fn replay<S>(prefix: Vec<u8>, rest: S) -> Body
where
    S: Stream<Item = Result<Bytes, axum::Error>> + Send + 'static,
{
    let head = stream::once(async move { Ok::<_, axum::Error>(Bytes::from(prefix)) });
    Body::from_stream(head.chain(rest))
}

/// Reads the created entity's identifier from a response body: `id`, or
/// `data.id` for enveloped responses.
fn created_entity_id(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let id = value
        .get("id")
        .or_else(|| value.get("data").and_then(|data| data.get("id")))?;
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn payload_object(body: &Bytes) -> Option<Map<String, Value>> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Axum middleware that audits successful mutations. See the module docs.
pub async fn audit_mutations(
    State(interceptor): State<AuditInterceptor>,
    request: Request,
    next: Next,
) -> Response {
    let Some(action) = action_for(request.method()) else {
        return next.run(request).await;
    };
    let Some(actor) = request
        .extensions()
        .get::<Actor>()
        .filter(|actor| !actor.user_id.trim().is_empty())
        .cloned()
    else {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "no actor on mutating request, skipping audit"
        );
        return next.run(request).await;
    };

    let (mut parts, body) = request.into_parts();
    let path_params = matched_path_params(&mut parts).await;
    let context = RequestContext::from_parts(&parts, path_params);

    let (payload, request) = if action == AuditAction::Delete {
        (None, Request::from_parts(parts, body))
    } else if exceeds_buffer(&parts.headers) {
        warn!(path = %context.path, %action, "request body too large to audit, skipping audit");
        return next.run(Request::from_parts(parts, body)).await;
    } else {
        match buffer_bounded(body, MAX_BUFFERED_BODY).await {
            Buffered::Complete(bytes) => (
                payload_object(&bytes),
                Request::from_parts(parts, Body::from(bytes)),
            ),
            Buffered::Passthrough(body) => {
                warn!(path = %context.path, %action, "request body not buffered, skipping audit");
                return next.run(Request::from_parts(parts, body)).await;
            }
        }
    };

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let before = context
        .before
        .clone()
        .or_else(|| response.extensions().get::<BeforeImage>().cloned());

    let (response, entity_id) = if action == AuditAction::Create {
        if exceeds_buffer(response.headers()) {
            warn!(path = %context.path, "response body too large to audit, skipping audit");
            return response;
        }
        let (res_parts, res_body) = response.into_parts();
        match buffer_bounded(res_body, MAX_BUFFERED_BODY).await {
            Buffered::Complete(bytes) => {
                let entity_id = created_entity_id(&bytes);
                (Response::from_parts(res_parts, Body::from(bytes)), entity_id)
            }
            Buffered::Passthrough(body) => {
                warn!(path = %context.path, "response body not buffered, skipping audit");
                return Response::from_parts(res_parts, body);
            }
        }
    } else {
        let entity_id = context.path_entity_id();
        (response, entity_id)
    };

    let Some(entity_id) = entity_id else {
        warn!(path = %context.path, %action, "could not determine entity id, skipping audit");
        return response;
    };

    let changes = compute_changes(
        action,
        payload.as_ref(),
        before.as_ref().map(|b| &b.0),
        interceptor.policy,
    );
    if changes.is_empty() {
        debug!(path = %context.path, %action, "mutation carried no fields, skipping audit");
        return response;
    }

    let mut metadata = Map::new();
    metadata.insert("service".to_owned(), json!(&*interceptor.service_name));
    metadata.insert("path".to_owned(), json!(context.path));
    metadata.insert("method".to_owned(), json!(context.method.as_str()));

    interceptor.dispatcher.dispatch(NewAuditEvent {
        entity_id,
        entity_type: interceptor.entity_type.to_string(),
        action,
        changes,
        user_id: actor.user_id,
        user_type: actor.user_type,
        ip_address: context.ip_address,
        user_agent: context.user_agent,
        metadata,
    });

    response
}
