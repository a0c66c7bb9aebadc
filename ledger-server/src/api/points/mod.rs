//! Points API 模块
//!
//! 积分录入与录入流水的审计操作。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/points", routes())
}

fn routes() -> Router<ServerState> {
    // 柜台路由：任何已登录员工都可以录入积分
    let staff_routes = Router::new().route("/accrue", post(handler::accrue));

    // 流水管理路由：需要 logs:manage 权限
    let log_routes = Router::new()
        .route("/logs", get(handler::list_logs))
        .route(
            "/logs/{bill}",
            put(handler::correct_log).delete(handler::delete_log),
        )
        .layer(middleware::from_fn(require_permission("logs:manage")));

    staff_routes.merge(log_routes)
}
