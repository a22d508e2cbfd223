use std::path::Path;

use anyhow::Result;
use exam_ingest::config::DEFAULT_SETTINGS_FILE;
use exam_ingest::utils::logging;
use exam_ingest::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：有配置文件时按文件 + 环境变量，否则只用环境变量
    let config_dir = Path::new(".");
    let config = if config_dir.join(DEFAULT_SETTINGS_FILE).exists() {
        Config::load(config_dir)?
    } else {
        let config = Config::from_env();
        config.validate()?;
        config
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
