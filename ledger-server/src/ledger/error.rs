//! Ledger Error Types
//!
//! 每个前置条件违例都有独立的错误类型，调用方可以稳定区分。

use crate::utils::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bill '{0}' has already been used")]
    DuplicateBill(String),

    #[error("Reward {0} not found")]
    RewardNotFound(String),

    #[error("Reward is inactive")]
    RewardInactive,

    #[error("Reward is out of stock")]
    RewardOutOfStock,

    #[error("Reward point cost is invalid")]
    InvalidRewardCost,

    #[error("Member {0} not found")]
    MemberNotFound(String),

    #[error("Phone number {0} is already registered")]
    PhoneInUse(String),

    #[error("Insufficient points (required {required}, available {available})")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => AppError::Validation(msg),
            LedgerError::DuplicateBill(_) | LedgerError::PhoneInUse(_) => {
                AppError::Conflict(err.to_string())
            }
            LedgerError::RewardNotFound(_) | LedgerError::MemberNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            LedgerError::RewardInactive
            | LedgerError::RewardOutOfStock
            | LedgerError::InvalidRewardCost
            | LedgerError::InsufficientPoints { .. } => AppError::BusinessRule(err.to_string()),
            LedgerError::Database(msg) => AppError::Database(msg),
        }
    }
}
