//! Authentication middleware for Axum
//!
//! The [`RequestGate`] decides, for every inbound request, whether it may
//! proceed and with which identity. It is an ordered pipeline of
//! [`GateStep`]s, each returning [`Decision::Continue`] with the (possibly
//! enriched) context or [`Decision::ShortCircuit`] with a response. The
//! driver stops at the first short-circuit.
//!
//! Policy:
//! - public paths and `OPTIONS` pre-flights bypass every step
//! - no `Authorization: Bearer` header: continue unauthenticated
//! - bearer token present but invalid: reject with 401
//! - valid token whose subject no longer exists: continue unauthenticated

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{AuthError, AuthenticatedAdmin, RequestIdentity, TokenService};
use crate::api::ApiError;
use crate::infra::PrincipalStore;

/// Path prefixes reachable without authentication
pub const DEFAULT_PUBLIC_PREFIXES: &[&str] = &["/auth", "/swagger", "/v3/api-docs", "/health"];

const BEARER_PREFIX: &str = "Bearer ";

/// Auth context extension for request
#[derive(Clone)]
pub struct RequestIdentityExt(pub RequestIdentity);

/// The parts of a request the gate inspects
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

impl<'a> GateRequest<'a> {
    pub fn from_request(request: &'a Request<Body>) -> Self {
        Self {
            method: request.method(),
            path: request.uri().path(),
            headers: request.headers(),
        }
    }
}

/// Working state threaded through the gate steps
#[derive(Debug, Clone, Default)]
pub struct GateContext {
    /// Subject of a validated token
    pub subject: Option<String>,

    /// Principal the subject resolved to
    pub admin: Option<AuthenticatedAdmin>,
}

impl GateContext {
    pub fn into_identity(self) -> RequestIdentity {
        match self.admin {
            Some(admin) => RequestIdentity::authenticated(admin),
            None => RequestIdentity::anonymous(),
        }
    }
}

/// Outcome of a gate step
pub enum Decision {
    Continue(GateContext),
    ShortCircuit(Response),
}

/// One step of the request gate pipeline
#[async_trait]
pub trait GateStep: Send + Sync {
    async fn evaluate(&self, request: &GateRequest<'_>, context: GateContext) -> Decision;
}

/// Static allow-list of public path prefixes
#[derive(Debug, Clone)]
pub struct PublicPaths {
    prefixes: Vec<String>,
}

impl PublicPaths {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a request bypasses authentication
    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        method == Method::OPTIONS || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIXES.iter().copied())
    }
}

/// Validates a bearer token, if one is presented
pub struct BearerTokenStep {
    tokens: Arc<TokenService>,
}

impl BearerTokenStep {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl GateStep for BearerTokenStep {
    async fn evaluate(&self, request: &GateRequest<'_>, mut context: GateContext) -> Decision {
        let Some(token) = bearer_token(request.headers) else {
            debug!(path = request.path, "No bearer token; continuing unauthenticated");
            return Decision::Continue(context);
        };

        match self.tokens.validate(token) {
            Ok(subject) => {
                context.subject = Some(subject);
                Decision::Continue(context)
            }
            Err(reason) => {
                warn!(path = request.path, %reason, "Rejected bearer token");
                Decision::ShortCircuit(ApiError::from(AuthError::InvalidToken(reason)).into_response())
            }
        }
    }
}

/// Resolves a validated subject to a stored principal
pub struct PrincipalResolutionStep {
    store: Arc<dyn PrincipalStore>,
}

impl PrincipalResolutionStep {
    pub fn new(store: Arc<dyn PrincipalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GateStep for PrincipalResolutionStep {
    async fn evaluate(&self, request: &GateRequest<'_>, mut context: GateContext) -> Decision {
        let Some(subject) = context.subject.as_deref() else {
            return Decision::Continue(context);
        };

        match self.store.find_by_identity_key(subject).await {
            Ok(Some(principal)) => {
                debug!(subject, path = request.path, "Request authenticated");
                context.admin = Some(AuthenticatedAdmin::from(&principal));
                Decision::Continue(context)
            }
            Ok(None) => {
                warn!(subject, "Token subject no longer exists; continuing unauthenticated");
                context.subject = None;
                Decision::Continue(context)
            }
            Err(e) => {
                error!(error = %e, "Principal lookup failed");
                Decision::ShortCircuit(ApiError::from(AuthError::Store(e)).into_response())
            }
        }
    }
}

/// Per-request authentication gate
pub struct RequestGate {
    public_paths: PublicPaths,
    steps: Vec<Box<dyn GateStep>>,
}

impl RequestGate {
    /// Gate with the default allow-list and the bearer token and principal
    /// resolution steps
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn PrincipalStore>) -> Self {
        Self::with_steps(
            PublicPaths::default(),
            vec![
                Box::new(BearerTokenStep::new(tokens)),
                Box::new(PrincipalResolutionStep::new(store)),
            ],
        )
    }

    pub fn with_steps(public_paths: PublicPaths, steps: Vec<Box<dyn GateStep>>) -> Self {
        Self {
            public_paths,
            steps,
        }
    }

    /// Run the pipeline for one request
    pub async fn evaluate(&self, request: &GateRequest<'_>) -> Decision {
        let mut context = GateContext::default();

        if self.public_paths.is_public(request.method, request.path) {
            return Decision::Continue(context);
        }

        for step in &self.steps {
            match step.evaluate(request, context).await {
                Decision::Continue(next) => context = next,
                short_circuit @ Decision::ShortCircuit(_) => return short_circuit,
            }
        }

        Decision::Continue(context)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(gate): State<Arc<RequestGate>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let gate_request = GateRequest::from_request(&request);
    let decision = gate.evaluate(&gate_request).await;

    match decision {
        Decision::Continue(context) => {
            request
                .extensions_mut()
                .insert(RequestIdentityExt(context.into_identity()));
            next.run(request).await
        }
        Decision::ShortCircuit(response) => response,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
}
