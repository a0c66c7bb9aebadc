use crate::auth::JwtConfig;

/// 服务器配置 - 台账服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/loyalty/ledger | 工作目录（数据库与日志） |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | BRANCH_ID | main | 本节点所属门店标识 |
/// | WELCOME_POINTS | 5 | 注册赠送积分 |
/// | ENVIRONMENT | development | 运行环境 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/loyalty HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 本节点所属门店标识（写入流水）
    pub branch_id: String,
    /// 注册赠送积分
    pub welcome_points: i64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/loyalty/ledger".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            branch_id: std::env::var("BRANCH_ID").unwrap_or_else(|_| "main".into()),
            welcome_points: std::env::var("WELCOME_POINTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件路径
    pub fn db_path(&self) -> String {
        format!("{}/ledger.db", self.work_dir)
    }

    /// 日志目录
    pub fn log_dir(&self) -> String {
        format!("{}/logs", self.work_dir)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::with_overrides("/tmp/ledger-test", 0);
        assert_eq!(config.work_dir, "/tmp/ledger-test");
        assert_eq!(config.http_port, 0);
        assert_eq!(config.db_path(), "/tmp/ledger-test/ledger.db");
    }
}
