//! Redemption Log API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::{RedemptionLog, RedemptionLogCorrection};
use crate::db::repository::RedemptionLogRepository;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub phone: String,
}

/// GET /api/redemptions/logs?phone=xxx - 按会员查兑换流水
pub async fn list_logs(
    State(state): State<ServerState>,
    Query(query): Query<LogsQuery>,
) -> AppResult<Json<Vec<RedemptionLog>>> {
    let logs = RedemptionLogRepository::new(state.db.clone())
        .find_by_phone(&query.phone)
        .await?;
    Ok(Json(logs))
}

/// PUT /api/redemptions/logs/{id} - 修正流水（日期）
pub async fn correct_log(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RedemptionLogCorrection>,
) -> AppResult<Json<RedemptionLog>> {
    let log = RedemptionLogRepository::new(state.db.clone())
        .correct(&id, payload)
        .await?;
    Ok(Json(log))
}

#[derive(Debug, Deserialize)]
pub struct DeleteLogRequest {
    pub reason: String,
}

/// DELETE /api/redemptions/logs/{id} - 软删除流水（必须给出原因）
///
/// 不回滚库存或积分，只把记录标记为已删除。
pub async fn delete_log(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<DeleteLogRequest>,
) -> AppResult<Json<RedemptionLog>> {
    if payload.reason.trim().is_empty() {
        return Err(AppError::validation("Delete reason is required"));
    }

    let log = RedemptionLogRepository::new(state.db.clone())
        .soft_delete(&id, &payload.reason)
        .await?;
    Ok(Json(log))
}
