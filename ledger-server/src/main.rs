use ledger_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境与日志
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir).ok();
    // 开发环境默认 debug 级别，生产环境 info；RUST_LOG 优先
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| if config.is_production() { "info" } else { "debug" }.to_string());
    ledger_server::init_logger_with_file(Some(&log_level), Some(&log_dir));

    tracing::info!("Loyalty Ledger Server starting...");

    // 2. 初始化服务器状态（打开数据库、引导管理员）
    let state = ServerState::initialize(&config).await?;

    // 3. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
