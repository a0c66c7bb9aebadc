//! JWT 令牌服务
//!
//! 处理 JWT 令牌的生成、验证和解析。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// JWT 密钥 (应至少 32 字节)
    pub secret: String,
    /// 令牌过期时间 (分钟)
    pub expiration_minutes: i64,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: load_jwt_secret(),
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440), // 默认 24 小时
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "ledger-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "loyalty-clients".to_string()),
        }
    }
}

/// 存储在令牌中的 JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 员工 ID (Subject)
    pub sub: String,
    /// 用户名
    pub username: String,
    /// 显示名称
    pub name: String,
    /// 门店/分店编号
    pub branch_id: String,
    /// 角色名称 (admin | staff)
    pub role: String,
    /// 权限列表 (逗号分隔)
    pub permissions: String,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),
}

/// 生成可打印的安全密钥 (用于开发环境或引导管理员口令)
pub fn generate_printable_secret(len: usize) -> String {
    let allowed_chars =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    let rng = SystemRandom::new();
    let mut key = String::with_capacity(len);

    for _ in 0..len {
        let mut byte = [0u8; 1];
        if rng.fill(&mut byte).is_err() {
            // 随机数生成失败时退回固定开发密钥
            return "LoyaltyLedgerDevelopmentSecureKey2026".to_string();
        }
        let idx = (byte[0] as usize) % allowed_chars.len();
        key.push(allowed_chars.as_bytes()[idx] as char);
    }

    key
}

/// 从环境变量加载 JWT 密钥
///
/// 未设置时生成一个临时密钥 (重启后旧令牌失效)
fn load_jwt_secret() -> String {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if secret.len() >= 32 => secret,
        Ok(_) => {
            tracing::warn!("JWT_SECRET shorter than 32 chars, generating temporary key");
            generate_printable_secret(64)
        }
        Err(_) => {
            tracing::warn!("JWT_SECRET not set, generating temporary key for this run");
            generate_printable_secret(64)
        }
    }
}

/// JWT 令牌服务
#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// 使用默认配置创建新的 JWT 服务
    pub fn new() -> Self {
        Self::with_config(JwtConfig::default())
    }

    /// 使用指定配置创建新的 JWT 服务
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为员工生成新令牌
    pub fn generate_token(
        &self,
        staff_id: &str,
        username: &str,
        name: &str,
        branch_id: &str,
        role: &str,
        permissions: &[String],
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: staff_id.to_string(),
            username: username.to_string(),
            name: name.to_string(),
            branch_id: branch_id.to_string(),
            role: role.to_string(),
            permissions: permissions.join(","),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

/// 当前用户上下文 (从 JWT Claims 解析)
///
/// 由认证中间件创建，注入到请求处理函数
///
/// # 示例
///
/// ```ignore
/// async fn handler(user: CurrentUser) -> Json<()> {
///     if user.has_permission("rewards:manage") {
///         // 有权限
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// 员工 ID
    pub id: String,
    /// 用户名
    pub username: String,
    /// 显示名称
    pub name: String,
    /// 门店/分店编号
    pub branch_id: String,
    /// 角色名称
    pub role: String,
    /// 权限列表
    pub permissions: Vec<String>,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        let permissions = if claims.permissions.is_empty() {
            vec![]
        } else {
            claims
                .permissions
                .split(',')
                .map(|s| s.to_string())
                .collect()
        };

        Self {
            id: claims.sub,
            username: claims.username,
            name: claims.name,
            branch_id: claims.branch_id,
            role: claims.role,
            permissions,
        }
    }
}

impl CurrentUser {
    /// 是否管理员
    ///
    /// 管理员角色 (`role == "admin"`) 拥有所有权限
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// 检查是否拥有指定权限
    ///
    /// # 规则
    ///
    /// 1. 管理员拥有所有权限
    /// 2. 权限列表包含 `"all"` 则拥有所有权限
    /// 3. 精确匹配或前缀匹配 (`:*` 通配符)
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() {
            return true;
        }

        if self.permissions.contains(&"all".to_string()) {
            return true;
        }

        self.permissions.iter().any(|p| {
            if p == permission {
                return true;
            }
            // 通配符模式，如 "rewards:*" 匹配 "rewards:manage"
            if let Some(prefix) = p.strip_suffix(":*") {
                permission.starts_with(&format!("{}:", prefix))
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "unit-test-secret-key-of-enough-length!".to_string(),
            expiration_minutes: 60,
            issuer: "ledger-server".to_string(),
            audience: "loyalty-clients".to_string(),
        })
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = test_service();
        let permissions = vec!["rewards:manage".to_string(), "members:manage".to_string()];

        let token = service
            .generate_token("staff:abc", "pim", "Pim S.", "BR01", "staff", &permissions)
            .expect("Failed to generate test token");

        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");

        assert_eq!(claims.sub, "staff:abc");
        assert_eq!(claims.username, "pim");
        assert_eq!(claims.branch_id, "BR01");
        assert_eq!(claims.role, "staff");
        assert_eq!(claims.permissions, "rewards:manage,members:manage");
    }

    #[test]
    fn test_current_user_permissions() {
        let user = CurrentUser {
            id: "1".to_string(),
            username: "pim".to_string(),
            name: "Pim S.".to_string(),
            branch_id: "BR01".to_string(),
            role: "staff".to_string(),
            permissions: vec!["reports:view".to_string(), "rewards:*".to_string()],
        };

        assert!(user.has_permission("reports:view"));
        assert!(user.has_permission("rewards:manage")); // Wildcard match
        assert!(!user.has_permission("staff:manage"));
    }

    #[test]
    fn test_admin_has_all_permissions() {
        let admin = CurrentUser {
            id: "1".to_string(),
            username: "admin".to_string(),
            name: "Admin".to_string(),
            branch_id: "HQ".to_string(),
            role: "admin".to_string(),
            permissions: vec![],
        };

        assert!(admin.has_permission("rewards:manage"));
        assert!(admin.has_permission("staff:manage"));
        assert!(admin.is_admin());
    }
}
