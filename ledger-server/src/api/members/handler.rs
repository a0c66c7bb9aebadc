//! Member API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Member, MemberCreate, MemberUpdate, RedemptionLog, SignupRequest};
use crate::db::repository::{MemberRepository, RedemptionLogRepository};
use crate::utils::{AppError, AppResult};

/// POST /api/members/signup - 会员自助注册（公共路由）
///
/// 注册赠送积分由 WELCOME_POINTS 配置，手机号重复时返回 409。
pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<Json<Member>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let member = MemberRepository::new(state.db.clone())
        .create(
            &payload.phone,
            &payload.name,
            payload.birthday,
            state.config.welcome_points,
        )
        .await?;

    tracing::info!(
        phone = %member.phone,
        points = member.points,
        "member signed up"
    );

    Ok(Json(member))
}

/// GET /api/members/{phone} - 余额查询（公共路由）
pub async fn get_by_phone(
    State(state): State<ServerState>,
    Path(phone): Path<String>,
) -> AppResult<Json<Member>> {
    let member = state
        .ledger
        .get_member_balance(&phone)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Member {}", phone)))?;

    Ok(Json(member))
}

/// GET /api/members/{phone}/redemptions/latest - 最近一次兑换（公共路由）
pub async fn latest_redemption(
    State(state): State<ServerState>,
    Path(phone): Path<String>,
) -> AppResult<Json<RedemptionLog>> {
    if !crate::utils::validation::is_valid_phone(&phone) {
        return Err(AppError::validation(format!(
            "Invalid phone number '{}'",
            phone
        )));
    }

    let log = RedemptionLogRepository::new(state.db.clone())
        .find_latest_by_phone(&phone)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No redemptions for member {}", phone)))?;

    Ok(Json(log))
}

/// GET /api/members - 获取所有会员
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Member>>> {
    let members = MemberRepository::new(state.db.clone()).find_all().await?;
    Ok(Json(members))
}

/// POST /api/members - 员工创建会员（不赠送注册积分）
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<MemberCreate>,
) -> AppResult<Json<Member>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let member = MemberRepository::new(state.db.clone())
        .create(&payload.phone, &payload.name, payload.birthday, 0)
        .await?;

    Ok(Json(member))
}

#[derive(Debug, serde::Deserialize)]
pub struct MigratePhoneRequest {
    pub new_phone: String,
}

/// POST /api/members/{phone}/migrate - 会员换号
///
/// 会员记录连同全部流水搬到新手机号，单一事务完成。
pub async fn migrate_phone(
    State(state): State<ServerState>,
    Path(phone): Path<String>,
    Json(payload): Json<MigratePhoneRequest>,
) -> AppResult<Json<Member>> {
    let member = state
        .ledger
        .migrate_phone(&phone, &payload.new_phone)
        .await?;

    Ok(Json(member))
}

/// PUT /api/members/{phone} - 更新会员（名称、生日、管理员余额修正）
pub async fn update(
    State(state): State<ServerState>,
    Path(phone): Path<String>,
    Json(payload): Json<MemberUpdate>,
) -> AppResult<Json<Member>> {
    let member = MemberRepository::new(state.db.clone())
        .update(&phone, payload)
        .await?;

    Ok(Json(member))
}
