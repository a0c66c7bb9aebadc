//! Member Model
//!
//! 会员以手机号为主键 (record key = phone)。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use surrealdb::sql::Datetime;
use validator::Validate;

/// Member model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub phone: String,
    #[serde(default)]
    pub name: String,
    /// 当前积分余额，不允许为负
    #[serde(default)]
    pub points: i64,
    /// 最近一次兑换的奖品名称
    #[serde(default)]
    pub last_reward: Option<String>,
    /// 最近一次兑换时间
    #[serde(default)]
    pub last_redeemed_at: Option<Datetime>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub created_at: Option<Datetime>,
    #[serde(default)]
    pub updated_at: Option<Datetime>,
}

/// 会员自助注册请求 (公共路由)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(custom(function = "crate::utils::validation::validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub birthday: Option<String>,
}

/// 员工创建会员 (members:manage)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberCreate {
    #[validate(custom(function = "crate::utils::validation::validate_phone"))]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    pub birthday: Option<String>,
}

/// Update member payload
///
/// `points` 仅限管理路径的余额修正；常规余额变动只能走积分/兑换流水。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}
