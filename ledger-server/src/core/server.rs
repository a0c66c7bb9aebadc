//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::auth::require_auth;
use crate::core::{Config, ServerState};
use crate::utils::AppError;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::auth::router())
        .merge(crate::api::members::router())
        .merge(crate::api::rewards::router())
        .merge(crate::api::points::router())
        .merge(crate::api::redemptions::router())
        .merge(crate::api::staff::router())
}

/// Build the full application with middleware stack applied
pub fn build_app_with_state(state: ServerState) -> Router {
    let request_timeout = Duration::from_millis(state.config.request_timeout_ms);

    build_app()
        // JWT 认证中间件 - 在 Router 级别应用，require_auth 内部会跳过公共路由
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        // 超时的请求返回 408
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(log_request))
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let app = build_app_with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Loyalty Ledger Server starting on {}", addr);

        let handle = axum_server::Handle::new();

        let handle_clone = handle.clone();
        let shutdown_timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
            handle_clone.graceful_shutdown(Some(shutdown_timeout));
        });

        axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .map_err(|e| AppError::internal(format!("HTTP server error: {}", e)))?;

        Ok(())
    }
}
