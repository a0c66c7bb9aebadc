//! grant-role - 一次性运维工具
//!
//! 直接打开嵌入式数据库，修改指定员工的角色。
//! 服务运行期间不要使用（RocksDB 单进程独占锁）。
//!
//! # 用法
//!
//! ```text
//! WORK_DIR=/var/lib/loyalty/ledger grant-role <username> <admin|staff>
//! ```

use ledger_server::Config;
use ledger_server::db::DbService;
use ledger_server::db::repository::StaffRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    ledger_server::init_logger();

    let mut args = std::env::args().skip(1);
    let (username, role) = match (args.next(), args.next()) {
        (Some(u), Some(r)) => (u, r),
        _ => {
            eprintln!("Usage: grant-role <username> <admin|staff>");
            std::process::exit(2);
        }
    };

    if role != "admin" && role != "staff" {
        eprintln!("Unknown role '{}' (expected admin or staff)", role);
        std::process::exit(2);
    }

    let config = Config::from_env();
    let db_service = DbService::new(&config.db_path()).await?;

    let staff = StaffRepository::new(db_service.db.clone())
        .set_role_by_username(&username, &role)
        .await?;

    println!("{} is now {}", staff.username, staff.role);

    Ok(())
}
