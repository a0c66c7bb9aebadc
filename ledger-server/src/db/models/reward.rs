//! Reward Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use surrealdb::sql::Datetime;

/// Reward catalog entry
///
/// 可兑换条件：`is_active && stock > 0 && point_cost > 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub name: String,
    /// 兑换所需积分，必须为正
    pub point_cost: i64,
    /// 剩余库存，不允许为负
    #[serde(default)]
    pub stock: i64,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// 可选的有效期窗口 (仅展示用)
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<Datetime>,
    #[serde(default)]
    pub updated_at: Option<Datetime>,
}

fn default_true() -> bool {
    true
}

/// Create reward payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardCreate {
    pub name: String,
    pub point_cost: i64,
    #[serde(default)]
    pub stock: i64,
    pub is_active: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Update reward payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_cost: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// 公共目录视图 (仅可兑换奖品)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemableReward {
    pub id: String,
    pub name: String,
    pub point_cost: i64,
    pub stock: i64,
}
