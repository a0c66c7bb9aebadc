//! Points API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{AccrualLog, AccrualLogCorrection};
use crate::db::repository::AccrualLogRepository;
use crate::ledger::{AccrualReceipt, StaffContext};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct AccrueRequest {
    pub phone: String,
    pub bill: String,
    pub amount: Decimal,
}

/// POST /api/points/accrue - 录入消费积分
///
/// points = floor(amount / 100)，重复小票返回 409。
pub async fn accrue(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<AccrueRequest>,
) -> AppResult<Json<AccrualReceipt>> {
    let staff = StaffContext::from(&current_user);
    let receipt = state
        .ledger
        .accrue_points(&payload.phone, &payload.bill, payload.amount, &staff)
        .await?;

    Ok(Json(receipt))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub phone: String,
}

/// GET /api/points/logs?phone=xxx - 按会员查录入流水
pub async fn list_logs(
    State(state): State<ServerState>,
    Query(query): Query<LogsQuery>,
) -> AppResult<Json<Vec<AccrualLog>>> {
    let logs = AccrualLogRepository::new(state.db.clone())
        .find_by_phone(&query.phone)
        .await?;
    Ok(Json(logs))
}

/// PUT /api/points/logs/{bill} - 修正流水（金额、日期）
///
/// 只改流水记录，不回溯调整会员余额。
pub async fn correct_log(
    State(state): State<ServerState>,
    Path(bill): Path<String>,
    Json(payload): Json<AccrualLogCorrection>,
) -> AppResult<Json<AccrualLog>> {
    let log = AccrualLogRepository::new(state.db.clone())
        .correct(&bill, payload)
        .await?;
    Ok(Json(log))
}

#[derive(Debug, Deserialize)]
pub struct DeleteLogRequest {
    pub reason: String,
}

/// DELETE /api/points/logs/{bill} - 软删除流水（必须给出原因）
pub async fn delete_log(
    State(state): State<ServerState>,
    Path(bill): Path<String>,
    Json(payload): Json<DeleteLogRequest>,
) -> AppResult<Json<AccrualLog>> {
    if payload.reason.trim().is_empty() {
        return Err(AppError::validation("Delete reason is required"));
    }

    let log = AccrualLogRepository::new(state.db.clone())
        .soft_delete(&bill, &payload.reason)
        .await?;
    Ok(Json(log))
}
