//! Member API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/members", routes())
}

fn routes() -> Router<ServerState> {
    // 公共路由：注册、余额查询、最近兑换（require_auth 内部跳过）
    let public_routes = Router::new()
        .route("/signup", post(handler::signup))
        .route("/{phone}", get(handler::get_by_phone))
        .route("/{phone}/redemptions/latest", get(handler::latest_redemption));

    // 管理路由：需要 members:manage 权限
    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{phone}", put(handler::update))
        .route("/{phone}/migrate", post(handler::migrate_phone))
        .layer(middleware::from_fn(require_permission("members:manage")));

    public_routes.merge(manage_routes)
}
