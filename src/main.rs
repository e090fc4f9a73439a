use anyhow::Result;
use biblio_fixer::cli::Cli;
use biblio_fixer::utils::logging;
use biblio_fixer::{App, Config};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::from_env();
    cli.apply_to(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging, &config.log_file)?;

    // 初始化并运行应用
    let app = App::new(config);
    cli.execute(&app).await?;

    Ok(())
}
