//! Redemption Log API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/redemptions", routes())
}

fn routes() -> Router<ServerState> {
    // 流水管理路由：需要 logs:manage 权限
    Router::new()
        .route("/logs", get(handler::list_logs))
        .route(
            "/logs/{id}",
            put(handler::correct_log).delete(handler::delete_log),
        )
        .layer(middleware::from_fn(require_permission("logs:manage")))
}
