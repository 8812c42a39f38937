pub mod cli;
pub mod errors;
pub mod loader;

use errors::FrontendError;
use takeoff_config::AppConfig;
use tracing::info;

/// 执行一次完整的模型空间统计并写回报表，或返回错误。
pub fn run_cli_report(config: &AppConfig) -> Result<(), FrontendError> {
    info!("启动模型空间统计");
    cli::run(config)
}
