//! Staff Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use surrealdb::sql::Datetime;

/// Staff ID type
pub type StaffId = RecordId;

/// Staff account matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<StaffId>,
    pub username: String,
    #[serde(skip_serializing)]
    pub hash_pass: String,
    #[serde(default)]
    pub name: String,
    /// 门店/分店编号
    #[serde(default)]
    pub branch_id: String,
    /// 角色: "admin" | "staff"
    pub role: String,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<Datetime>,
    #[serde(default)]
    pub updated_at: Option<Datetime>,
}

fn default_true() -> bool {
    true
}

/// Create staff payload
#[derive(Debug, Clone, Deserialize)]
pub struct StaffCreate {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: String,
    /// 缺省为普通柜台员工
    pub role: Option<String>,
}

/// Update staff payload
#[derive(Debug, Clone, Deserialize)]
pub struct StaffUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub branch_id: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl Staff {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = Staff::hash_password("s3cret!").unwrap();
        let staff = Staff {
            id: None,
            username: "pim".to_string(),
            hash_pass: hash,
            name: "Pim S.".to_string(),
            branch_id: "BR01".to_string(),
            role: "staff".to_string(),
            is_active: true,
            created_at: None,
            updated_at: None,
        };

        assert!(staff.verify_password("s3cret!").unwrap());
        assert!(!staff.verify_password("wrong").unwrap());
    }
}
