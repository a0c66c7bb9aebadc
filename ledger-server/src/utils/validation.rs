//! Request Validation Helpers
//!
//! 会员手机号与小票编号的格式校验。
//!
//! 规则沿用柜台端的输入约束：
//! - 手机号：泰国格式，`0` 开头的 10 位数字
//! - 小票编号：至少 5 位的字母数字 (A-Z, a-z, 0-9)

use validator::ValidationError;

/// Check Thai mobile number format: `0` followed by 9 digits
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10
        && phone.starts_with('0')
        && phone.chars().all(|c| c.is_ascii_digit())
}

/// Check bill/receipt reference format: alphanumeric, at least 5 chars
pub fn is_valid_bill(bill: &str) -> bool {
    bill.len() >= 5 && bill.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Custom validator for `#[validate(custom)]` on request DTOs
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_format"))
    }
}

/// Custom validator for `#[validate(custom)]` on request DTOs
pub fn validate_bill(bill: &str) -> Result<(), ValidationError> {
    if is_valid_bill(bill) {
        Ok(())
    } else {
        Err(ValidationError::new("bill_format"))
    }
}
