//! HTTP server for furliefd

use crate::metrics::FunnelMetrics;
use crate::routes;
use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use furlief_common::{Config, SqliteStore, WaitlistService};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub service: WaitlistService<SqliteStore>,
    pub config: Config,
    pub metrics: FunnelMetrics,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: SqliteStore, config: Config) -> Result<Self> {
        let service = WaitlistService::new(Arc::new(store), config.waitlist.fallback_total);
        let metrics = FunnelMetrics::new().context("Failed to register metrics")?;
        Ok(Self {
            service,
            config,
            metrics,
            start_time: Instant::now(),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_origins(origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(crate::context::SESSION_HEADER),
        ])
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect()
}

/// Build the full router
pub fn router(state: Arc<AppState>) -> Router {
    let max_body = state.config.server.max_body_bytes;
    let cors = cors_layer(&state.config.server.allowed_origins);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::quiz_routes())
        .merge(routes::symptom_routes())
        .merge(routes::waitlist_routes())
        .merge(routes::event_routes())
        .merge(routes::metrics_routes())
        .merge(routes::admin_routes(Arc::clone(&state)))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    if !state.config.admin.is_enabled() {
        warn!("No admin tokens configured, admin API is disabled");
    }

    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
