//! Accrual Log Repository
//!
//! 流水在兑换/录入事务内创建（见 `ledger::LedgerService`），
//! 这里只提供查询与管理员修正路径。

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{AccrualLog, AccrualLogCorrection};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Datetime;

const TABLE: &str = "accrual_log";

#[derive(Clone)]
pub struct AccrualLogRepository {
    base: BaseRepository,
}

impl AccrualLogRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find log entries for a member, newest first (excludes soft-deleted)
    pub async fn find_by_phone(&self, phone: &str) -> RepoResult<Vec<AccrualLog>> {
        let logs: Vec<AccrualLog> = self
            .base
            .db()
            .query(
                "SELECT * FROM accrual_log \
                 WHERE phone = $phone AND is_deleted = false \
                 ORDER BY created_at DESC",
            )
            .bind(("phone", phone.to_string()))
            .await?
            .take(0)?;
        Ok(logs)
    }

    /// Find a log entry by bill id (record key)
    pub async fn find_by_bill(&self, bill: &str) -> RepoResult<Option<AccrualLog>> {
        let log: Option<AccrualLog> = self.base.db().select((TABLE, bill.to_string())).await?;
        Ok(log)
    }

    /// Admin correction: amend logged amount and/or date.
    ///
    /// 只修正流水本身，不回溯调整会员余额。
    pub async fn correct(&self, bill: &str, data: AccrualLogCorrection) -> RepoResult<AccrualLog> {
        let created_at: Option<Datetime> = data.created_at.map(Datetime::from);

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE type::thing('accrual_log', $bill) SET
                    amount = IF $has_amount THEN $amount ELSE amount END,
                    created_at = IF $has_created_at THEN $created_at ELSE created_at END
                RETURN AFTER"#,
            )
            .bind(("bill", bill.to_string()))
            .bind(("has_amount", data.amount.is_some()))
            .bind(("amount", data.amount))
            .bind(("has_created_at", created_at.is_some()))
            .bind(("created_at", created_at))
            .await?;

        result
            .take::<Option<AccrualLog>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Accrual log '{}' not found", bill)))
    }

    /// Admin soft delete with reason
    pub async fn soft_delete(&self, bill: &str, reason: &str) -> RepoResult<AccrualLog> {
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE type::thing('accrual_log', $bill) SET
                    is_deleted = true,
                    delete_reason = $reason
                RETURN AFTER"#,
            )
            .bind(("bill", bill.to_string()))
            .bind(("reason", reason.to_string()))
            .await?;

        result
            .take::<Option<AccrualLog>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Accrual log '{}' not found", bill)))
    }
}
