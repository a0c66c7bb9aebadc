//! Accrual Log Model
//!
//! 积分录入流水。record key = 小票编号 (bill)，
//! 利用存储层的主键唯一性在事务内拒绝重复小票。

use super::serde_helpers;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use surrealdb::sql::Datetime;

/// Immutable accrual log entry (soft-delete only via admin override)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualLog {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// 小票编号，全局唯一
    pub bill: String,
    pub phone: String,
    /// 消费金额 (泰铢)
    pub amount: Decimal,
    /// 本次发放积分 = floor(amount / 100)
    pub points_added: i64,
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
///
/// 只修正流水记录本身，不回溯调整会员余额。
#[derive(Debug, Clone, Deserialize)]
pub struct AccrualLogCorrection {
    pub amount: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
}
