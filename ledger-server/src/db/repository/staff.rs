//! Staff Repository

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Staff, StaffCreate, StaffUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "staff";

#[derive(Clone)]
pub struct StaffRepository {
    base: BaseRepository,
}

impl StaffRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all staff accounts
    pub async fn find_all(&self) -> RepoResult<Vec<Staff>> {
        let staff: Vec<Staff> = self
            .base
            .db()
            .query("SELECT * FROM staff ORDER BY username")
            .await?
            .take(0)?;
        Ok(staff)
    }

    /// Find staff by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Staff>> {
        let rid = parse_record_id(TABLE, id)?;
        let staff: Option<Staff> = self.base.db().select(rid).await?;
        Ok(staff)
    }

    /// Find staff by username (case-insensitive)
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<Staff>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM staff \
                 WHERE string::lowercase(username) = string::lowercase($username) LIMIT 1",
            )
            .bind(("username", username.to_string()))
            .await?;
        let staff: Vec<Staff> = result.take(0)?;
        Ok(staff.into_iter().next())
    }

    /// Count staff accounts (used by first-run bootstrap)
    pub async fn count(&self) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("RETURN (SELECT count() FROM staff GROUP ALL)[0].count OR 0")
            .await?;
        let count: Option<i64> = result.take(0)?;
        Ok(count.unwrap_or(0))
    }

    /// Create a new staff account
    pub async fn create(&self, data: StaffCreate) -> RepoResult<Staff> {
        // Check duplicate username
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let role = data.role.unwrap_or_else(|| "staff".to_string());
        if role != "admin" && role != "staff" {
            return Err(RepoError::Validation(format!("Unknown role '{}'", role)));
        }

        // Hash password
        let hash_pass = Staff::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE staff SET
                    username = $username,
                    hash_pass = $hash_pass,
                    name = $name,
                    branch_id = $branch_id,
                    role = $role,
                    is_active = true,
                    created_at = time::now(),
                    updated_at = time::now()
                RETURN AFTER"#,
            )
            .bind(("username", data.username))
            .bind(("hash_pass", hash_pass))
            .bind(("name", data.name))
            .bind(("branch_id", data.branch_id))
            .bind(("role", role))
            .await?;

        let created: Option<Staff> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create staff".to_string()))
    }

    /// Update a staff account
    pub async fn update(&self, id: &str, data: StaffUpdate) -> RepoResult<Staff> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Staff {} not found", id)))?;

        // Check duplicate username if changing
        if let Some(ref new_username) = data.username
            && !new_username.eq_ignore_ascii_case(&existing.username)
            && self.find_by_username(new_username).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                new_username
            )));
        }

        if let Some(ref role) = data.role
            && role != "admin"
            && role != "staff"
        {
            return Err(RepoError::Validation(format!("Unknown role '{}'", role)));
        }

        let hash_pass = if let Some(ref password) = data.password {
            Some(
                Staff::hash_password(password)
                    .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?,
            )
        } else {
            None
        };

        let rid = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    username = $username OR username,
                    hash_pass = $hash_pass OR hash_pass,
                    name = $name OR name,
                    branch_id = $branch_id OR branch_id,
                    role = $role OR role,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END,
                    updated_at = time::now()
                RETURN AFTER"#,
            )
            .bind(("thing", rid))
            .bind(("username", data.username))
            .bind(("hash_pass", hash_pass))
            .bind(("name", data.name))
            .bind(("branch_id", data.branch_id))
            .bind(("role", data.role))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .await?;

        result
            .take::<Option<Staff>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Staff {} not found", id)))
    }

    /// Hard delete a staff account
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let rid = parse_record_id(TABLE, id)?;
        let existing: Option<Staff> = self.base.db().select(rid.clone()).await?;
        if existing.is_none() {
            return Err(RepoError::NotFound(format!("Staff {} not found", id)));
        }

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", rid))
            .await?;
        Ok(true)
    }

    /// Set role for a staff account by username (bootstrap tool path)
    pub async fn set_role_by_username(&self, username: &str, role: &str) -> RepoResult<Staff> {
        let existing = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Staff '{}' not found", username)))?;

        let id = existing
            .id
            .as_ref()
            .map(|id| id.to_string())
            .ok_or_else(|| RepoError::Database("Staff record missing id".to_string()))?;

        self.update(
            &id,
            StaffUpdate {
                username: None,
                password: None,
                name: None,
                branch_id: None,
                role: Some(role.to_string()),
                is_active: None,
            },
        )
        .await
    }
}
