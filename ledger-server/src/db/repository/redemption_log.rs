//! Redemption Log Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{RedemptionLog, RedemptionLogCorrection};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Datetime;

const TABLE: &str = "redemption_log";

#[derive(Clone)]
pub struct RedemptionLogRepository {
    base: BaseRepository,
}

impl RedemptionLogRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find log entries for a member, newest first (excludes soft-deleted)
    pub async fn find_by_phone(&self, phone: &str) -> RepoResult<Vec<RedemptionLog>> {
        let logs: Vec<RedemptionLog> = self
            .base
            .db()
            .query(
                "SELECT * FROM redemption_log \
                 WHERE phone = $phone AND is_deleted = false \
                 ORDER BY created_at DESC",
            )
            .bind(("phone", phone.to_string()))
            .await?
            .take(0)?;
        Ok(logs)
    }

    /// Latest redemption for a member (user-facing "last reward" view)
    pub async fn find_latest_by_phone(&self, phone: &str) -> RepoResult<Option<RedemptionLog>> {
        let logs = self.find_by_phone(phone).await?;
        Ok(logs.into_iter().next())
    }

    /// Admin correction: amend logged date
    pub async fn correct(
        &self,
        id: &str,
        data: RedemptionLogCorrection,
    ) -> RepoResult<RedemptionLog> {
        let created_at: Option<Datetime> = data.created_at.map(Datetime::from);
        let rid = parse_record_id(TABLE, id)?;

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    created_at = IF $has_created_at THEN $created_at ELSE created_at END
                RETURN AFTER"#,
            )
            .bind(("thing", rid))
            .bind(("has_created_at", created_at.is_some()))
            .bind(("created_at", created_at))
            .await?;

        result
            .take::<Option<RedemptionLog>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Redemption log '{}' not found", id)))
    }

    /// Admin soft delete with reason
    pub async fn soft_delete(&self, id: &str, reason: &str) -> RepoResult<RedemptionLog> {
        let rid = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    is_deleted = true,
                    delete_reason = $reason
                RETURN AFTER"#,
            )
            .bind(("thing", rid))
            .bind(("reason", reason.to_string()))
            .await?;

        result
            .take::<Option<RedemptionLog>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Redemption log '{}' not found", id)))
    }
}
