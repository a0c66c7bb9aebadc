//! Auth API 模块

mod handler;

use axum::{Router, routing::{get, post}};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // 登录为公共路由（require_auth 内部跳过）
        .route("/login", post(handler::login))
        .route("/me", get(handler::me))
}
