//! Reward API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{RedeemableReward, Reward, RewardCreate, RewardUpdate};
use crate::db::repository::RewardRepository;
use crate::ledger::{RedemptionReceipt, StaffContext};
use crate::utils::AppResult;

/// GET /api/rewards/redeemable - 可兑换目录（公共路由）
///
/// 只返回 active 且有库存、积分成本为正的奖品，按积分从低到高。
pub async fn list_redeemable(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<RedeemableReward>>> {
    let rewards = state.ledger.list_redeemable_rewards().await?;
    Ok(Json(rewards))
}

/// GET /api/rewards - 获取所有奖品（含下架与零库存）
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Reward>>> {
    let rewards = RewardRepository::new(state.db.clone()).find_all().await?;
    Ok(Json(rewards))
}

/// POST /api/rewards - 创建奖品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<RewardCreate>,
) -> AppResult<Json<Reward>> {
    let reward = RewardRepository::new(state.db.clone()).create(payload).await?;
    Ok(Json(reward))
}

/// PUT /api/rewards/{id} - 更新奖品
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RewardUpdate>,
) -> AppResult<Json<Reward>> {
    let reward = RewardRepository::new(state.db.clone())
        .update(&id, payload)
        .await?;
    Ok(Json(reward))
}

/// DELETE /api/rewards/{id} - 删除奖品
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let result = RewardRepository::new(state.db.clone()).delete(&id).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub phone: String,
}

/// POST /api/rewards/{id}/redeem - 柜台兑换
///
/// 扣库存、扣积分、写流水在单一事务内完成。
pub async fn redeem(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<RedeemRequest>,
) -> AppResult<Json<RedemptionReceipt>> {
    let staff = StaffContext::from(&current_user);
    let receipt = state
        .ledger
        .redeem_reward(&payload.phone, &id, &staff)
        .await?;

    Ok(Json(receipt))
}
