//! HTTP server bootstrap for admin-auth.
//!
//! This module wires together:
//! - configuration
//! - the principal store (PostgreSQL, or in-memory when no database is set)
//! - credential and token services
//! - the request gate and the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::header::{self, HeaderName};
use axum::http::{HeaderValue, Method};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::ERROR_CODE_HEADER;
use crate::auth::{CredentialHasher, CredentialService, JwtConfig, RequestGate, TokenService};
use crate::infra::{InMemoryPrincipalStore, PgPrincipalStore, PrincipalStore};

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "admin_auth=info,tower_http=info";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// Token signing configuration.
    pub jwt: JwtConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let port: u16 = match std::env::var("PORT") {
            Ok(p) => p.parse().with_context(|| format!("Invalid PORT {p:?}"))?,
            Err(_) => 8080,
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("Invalid listen address {host}:{port}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            jwt,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn PrincipalStore>,
}

impl AppState {
    /// Assemble services around a principal store.
    pub fn new(
        store: Arc<dyn PrincipalStore>,
        hasher: CredentialHasher,
        tokens: TokenService,
    ) -> Self {
        Self {
            credentials: Arc::new(CredentialService::new(store.clone(), Arc::new(hasher))),
            tokens: Arc::new(tokens),
            store,
        }
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting admin-auth v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);

    let tokens = TokenService::new(&config.jwt)?;
    let hasher = CredentialHasher::from_env()?;

    let store: Arc<dyn PrincipalStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to PostgreSQL...");
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            info!("Connected to PostgreSQL");

            let store = PgPrincipalStore::new(pool);
            store.initialize().await?;
            info!("Administrator schema ready");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory principal store (data is lost on restart)");
            Arc::new(InMemoryPrincipalStore::new())
        }
    };

    let state = AppState::new(store, hasher, tokens);

    let mut app = build_app(state);
    if let Some(cors_layer) = cors_layer_from_env()? {
        app = app.layer(cors_layer);
    }

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("admin-auth is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Build the full application: routes, request gate and request tracing.
pub fn build_app(state: AppState) -> Router {
    let gate = Arc::new(RequestGate::new(state.tokens.clone(), state.store.clone()));

    crate::api::router()
        .layer(axum::middleware::from_fn_with_state(
            gate,
            crate::auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser origins allowed to call the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parse a `CORS_ALLOW_ORIGINS` value. Blank input disables CORS.
    pub fn parse(raw: &str) -> anyhow::Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if raw == "*" {
            return Ok(Some(Self::Any));
        }

        let origins = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    anyhow::bail!("wildcard origin cannot be combined with a list");
                }
                s.parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin {s:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if origins.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::List(origins)))
    }
}

/// CORS policy for the served routes.
///
/// Clients send JSON bodies and bearer tokens and may read the error code
/// header on failures. Preflight `OPTIONS` is answered by the layer itself.
pub fn cors_layer(origins: CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(list) => AllowOrigin::list(list),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(ERROR_CODE_HEADER)])
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let Ok(raw) = std::env::var("CORS_ALLOW_ORIGINS") else {
        return Ok(None);
    };
    Ok(CorsOrigins::parse(&raw)?.map(cors_layer))
}
