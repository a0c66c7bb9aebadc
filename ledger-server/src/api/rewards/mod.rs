//! Reward API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/rewards", routes())
}

fn routes() -> Router<ServerState> {
    // 公共路由：可兑换目录（require_auth 内部跳过）
    let public_routes = Router::new().route("/redeemable", get(handler::list_redeemable));

    // 柜台路由：任何已登录员工都可以执行兑换
    let staff_routes = Router::new().route("/{id}/redeem", post(handler::redeem));

    // 管理路由：需要 rewards:manage 权限（完整目录含下架奖品）
    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_permission("rewards:manage")));

    public_routes.merge(staff_routes).merge(manage_routes)
}
