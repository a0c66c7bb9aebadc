//! Staff API 模块
//!
//! 员工账号管理，仅管理员可用。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/staff", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_admin))
}
