//! Member Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Member, MemberUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "member";

#[derive(Clone)]
pub struct MemberRepository {
    base: BaseRepository,
}

impl MemberRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all members, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Member>> {
        let members: Vec<Member> = self
            .base
            .db()
            .query("SELECT * FROM member ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(members)
    }

    /// Find member by phone number (record key)
    pub async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Member>> {
        let member: Option<Member> = self.base.db().select((TABLE, phone.to_string())).await?;
        Ok(member)
    }

    /// Create a member with the given starting balance.
    ///
    /// 手机号即 record key，重复注册由主键唯一性拒绝。
    pub async fn create(
        &self,
        phone: &str,
        name: &str,
        birthday: Option<String>,
        initial_points: i64,
    ) -> RepoResult<Member> {
        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE type::thing('member', $phone) SET
                    phone = $phone,
                    name = $name,
                    points = $points,
                    last_reward = NONE,
                    last_redeemed_at = NONE,
                    birthday = $birthday,
                    created_at = time::now(),
                    updated_at = time::now()
                RETURN AFTER"#,
            )
            .bind(("phone", phone.to_string()))
            .bind(("name", name.to_string()))
            .bind(("points", initial_points))
            .bind(("birthday", birthday))
            .await?;

        let created: Result<Option<Member>, surrealdb::Error> = result.take(0);
        match created {
            Ok(Some(member)) => Ok(member),
            Ok(None) => Err(RepoError::Database("Failed to create member".to_string())),
            Err(e) if e.to_string().contains("already exists") => Err(RepoError::Duplicate(
                format!("Member '{}' already exists", phone),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a member (name / birthday / admin balance correction)
    pub async fn update(&self, phone: &str, data: MemberUpdate) -> RepoResult<Member> {
        if let Some(points) = data.points
            && points < 0
        {
            return Err(RepoError::Validation(
                "Balance must not be negative".to_string(),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE type::thing('member', $phone) SET
                    name = $name OR name,
                    birthday = $birthday OR birthday,
                    points = IF $has_points THEN $points ELSE points END,
                    updated_at = time::now()
                RETURN AFTER"#,
            )
            .bind(("phone", phone.to_string()))
            .bind(("name", data.name))
            .bind(("birthday", data.birthday))
            .bind(("has_points", data.points.is_some()))
            .bind(("points", data.points))
            .await?;

        result
            .take::<Option<Member>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Member {} not found", phone)))
    }
}
