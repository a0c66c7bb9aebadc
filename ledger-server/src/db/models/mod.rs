//! Database Models

// Serde helpers
pub mod serde_helpers;

// Auth
pub mod staff;

// Loyalty domain
pub mod accrual_log;
pub mod member;
pub mod redemption_log;
pub mod reward;

// Re-exports
pub use accrual_log::{AccrualLog, AccrualLogCorrection};
pub use member::{Member, MemberCreate, MemberUpdate, SignupRequest};
pub use redemption_log::{RedemptionLog, RedemptionLogCorrection};
pub use reward::{RedeemableReward, Reward, RewardCreate, RewardUpdate};
pub use staff::{Staff, StaffCreate, StaffId, StaffUpdate};
