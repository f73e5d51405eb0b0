//! Application startup and lifecycle management.

use crate::config::{BackofficeConfig, StoreBackend};
use crate::handlers::{self, health_check, metrics_endpoint, readiness_check};
use crate::services::{InMemoryStore, MongoStore, RecordStore, Records};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: BackofficeConfig,
    pub records: Records,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BackofficeConfig) -> Result<Self, AppError> {
        let store: Arc<dyn RecordStore> = match config.store {
            StoreBackend::Mongo => {
                let db = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;

                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;

                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory record store; records are not persisted");
                Arc::new(InMemoryStore::new())
            }
        };

        let state = AppState {
            config: config.clone(),
            records: Records::new(store),
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, store = ?config.store, "Backoffice service bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        // Sales
        .route(
            "/sales",
            post(handlers::sales::create_sale).get(handlers::sales::list_sales),
        )
        .route(
            "/sales/:id",
            get(handlers::sales::get_sale)
                .put(handlers::sales::update_sale)
                .delete(handlers::sales::delete_sale),
        )
        .route(
            "/sales/:id/payments",
            post(handlers::sales::record_payment).get(handlers::sales::list_payments),
        )
        .route("/sales/:id/cancel", post(handlers::sales::cancel_sale))
        .route(
            "/sales/:id/changes",
            post(handlers::sales::preview_sale_changes),
        )
        // Procurements
        .route(
            "/procurements",
            post(handlers::procurements::create_procurement)
                .get(handlers::procurements::list_procurements),
        )
        .route(
            "/procurements/:id",
            get(handlers::procurements::get_procurement)
                .put(handlers::procurements::update_procurement)
                .delete(handlers::procurements::delete_procurement),
        )
        // Loans
        .route(
            "/loans",
            post(handlers::loans::create_loan).get(handlers::loans::list_loans),
        )
        .route("/loans/:id", get(handlers::loans::get_loan))
        .route(
            "/loans/:id/payments",
            post(handlers::loans::record_payment).get(handlers::loans::list_payments),
        )
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
