//! Redemption Log Model
//!
//! 兑换流水。只在兑换事务成功时创建，
//! 记录奖品名称与积分成本的快照，后续奖品编辑不影响历史。

use super::serde_helpers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use surrealdb::sql::Datetime;

/// Immutable redemption log entry (soft-delete only via admin override)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionLog {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub phone: String,
    /// 兑换时的奖品 ID ("reward:xxx")
    pub reward_id: String,
    /// 奖品名称快照
    pub reward_name: String,
    /// 扣减积分快照
    pub points_used: i64,
    pub staff_id: String,
    #[serde(default)]
    pub staff_name: String,
    #[serde(default)]
    pub branch_id: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_deleted: bool,
    #[serde(default)]
    pub delete_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<Datetime>,
}

/// 管理员流水修正 (logs:manage)
#[derive(Debug, Clone, Deserialize)]
pub struct RedemptionLogCorrection {
    pub created_at: Option<DateTime<Utc>>,
}
