//! Reward Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{RedeemableReward, Reward, RewardCreate, RewardUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "reward";

#[derive(Clone)]
pub struct RewardRepository {
    base: BaseRepository,
}

impl RewardRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all rewards (admin view), newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Reward>> {
        let rewards: Vec<Reward> = self
            .base
            .db()
            .query("SELECT * FROM reward ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(rewards)
    }

    /// Redeemable catalog: active with stock, cheapest first
    pub async fn find_redeemable(&self) -> RepoResult<Vec<RedeemableReward>> {
        let rewards: Vec<RedeemableReward> = self
            .base
            .db()
            .query(
                "SELECT <string>id AS id, name, point_cost, stock FROM reward \
                 WHERE is_active = true AND stock > 0 AND point_cost > 0 \
                 ORDER BY point_cost ASC",
            )
            .await?
            .take(0)?;
        Ok(rewards)
    }

    /// Find reward by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Reward>> {
        let rid = parse_record_id(TABLE, id)?;
        let reward: Option<Reward> = self.base.db().select(rid).await?;
        Ok(reward)
    }

    /// Create a new reward
    pub async fn create(&self, data: RewardCreate) -> RepoResult<Reward> {
        if data.point_cost <= 0 {
            return Err(RepoError::Validation(
                "Point cost must be positive".to_string(),
            ));
        }
        if data.stock < 0 {
            return Err(RepoError::Validation(
                "Stock must not be negative".to_string(),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE reward SET
                    name = $name,
                    point_cost = $point_cost,
                    stock = $stock,
                    is_active = $is_active,
                    start_date = $start_date,
                    end_date = $end_date,
                    created_at = time::now(),
                    updated_at = time::now()
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("point_cost", data.point_cost))
            .bind(("stock", data.stock))
            .bind(("is_active", data.is_active.unwrap_or(true)))
            .bind(("start_date", data.start_date))
            .bind(("end_date", data.end_date))
            .await?;

        let created: Option<Reward> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create reward".to_string()))
    }

    /// Update a reward
    pub async fn update(&self, id: &str, data: RewardUpdate) -> RepoResult<Reward> {
        if let Some(point_cost) = data.point_cost
            && point_cost <= 0
        {
            return Err(RepoError::Validation(
                "Point cost must be positive".to_string(),
            ));
        }
        if let Some(stock) = data.stock
            && stock < 0
        {
            return Err(RepoError::Validation(
                "Stock must not be negative".to_string(),
            ));
        }

        let rid = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    point_cost = IF $has_point_cost THEN $point_cost ELSE point_cost END,
                    stock = IF $has_stock THEN $stock ELSE stock END,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END,
                    start_date = IF $has_start_date THEN $start_date ELSE start_date END,
                    end_date = IF $has_end_date THEN $end_date ELSE end_date END,
                    updated_at = time::now()
                RETURN AFTER"#,
            )
            .bind(("thing", rid))
            .bind(("name", data.name))
            .bind(("has_point_cost", data.point_cost.is_some()))
            .bind(("point_cost", data.point_cost))
            .bind(("has_stock", data.stock.is_some()))
            .bind(("stock", data.stock))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .bind(("has_start_date", data.start_date.is_some()))
            .bind(("start_date", data.start_date))
            .bind(("has_end_date", data.end_date.is_some()))
            .bind(("end_date", data.end_date))
            .await?;

        result
            .take::<Option<Reward>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Reward {} not found", id)))
    }

    /// Hard delete a reward
    ///
    /// 历史兑换流水保留名称/积分快照，不受目录删除影响。
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(TABLE, id)?;
        let existing: Option<Reward> = self.base.db().select(rid.clone()).await?;
        if existing.is_none() {
            return Err(RepoError::NotFound(format!("Reward {} not found", id)));
        }

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", rid))
            .await?;
        Ok(true)
    }
}
