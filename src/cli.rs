//! 命令行接口

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{Provider, SavedState};
use crate::orchestrator::App;

/// 使用 LLM 把书目条目转换为目标引用格式
#[derive(Debug, Parser)]
#[command(name = "biblio_fixer", version, about)]
pub struct Cli {
    /// 设置和示例的存储文件
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 同时把日志写入文件
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 转换文件中的所有书目（每行一条）
    Run {
        input: PathBuf,
        /// 结果文件
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 输出包含校验详情的 JSON 报告
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// 校验已有的转换结果，两个文件按行对应
    Check {
        originals: PathBuf,
        converted: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// 查看或修改设置
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// 管理 few-shot 示例
    Examples {
        #[command(subcommand)]
        command: ExamplesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// 显示当前设置
    Show,
    /// 设置目标格式，例如 "APA 7th"
    Style { style: String },
    /// 设置每批并发数
    Concurrency { limit: usize },
    /// 设置提供商的 API Key
    Key { provider: String, key: String },
    /// 设置生成器模型
    Generator {
        provider: String,
        model: String,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// 设置校验器模型
    Validator {
        provider: String,
        model: String,
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExamplesCommand {
    /// 列出所有示例
    List,
    /// 添加示例
    Add { original: String, expected: String },
    /// 修改示例
    Update {
        id: String,
        #[arg(long)]
        original: Option<String>,
        #[arg(long)]
        expected: Option<String>,
    },
    /// 删除示例
    Remove { id: String },
}

impl Cli {
    /// 命令行参数覆盖环境配置
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(storage) = &self.storage {
            config.storage_path = storage.to_string_lossy().to_string();
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        config.verbose_logging |= self.verbose;
    }

    /// 执行命令
    pub async fn execute(self, app: &App) -> Result<()> {
        match self.command {
            Command::Run {
                input,
                output,
                report,
            } => {
                app.run(&input, output.as_deref(), report.as_deref()).await?;
            }
            Command::Check {
                originals,
                converted,
                report,
            } => {
                app.check(&originals, &converted, report.as_deref()).await?;
            }
            Command::Settings { command } => settings_command(app, command).await?,
            Command::Examples { command } => examples_command(app, command).await?,
        }
        Ok(())
    }
}

fn parse_provider(name: &str) -> Result<Provider> {
    Provider::from_str(name).ok_or_else(|| {
        let supported: Vec<_> = Provider::ALL.iter().map(|p| p.as_str()).collect();
        anyhow!("无效的提供商: {}，支持: {}", name, supported.join(", "))
    })
}

fn check_base_url(provider: Provider, base_url: &Option<String>) {
    if provider == Provider::Custom && base_url.is_none() {
        warn!("⚠️ custom 提供商需要配置 --base-url，例如 http://localhost:1234/v1");
    }
}

async fn settings_command(app: &App, command: SettingsCommand) -> Result<()> {
    let state = match command {
        SettingsCommand::Show => {
            print_settings(&app.load_state().await?);
            return Ok(());
        }
        SettingsCommand::Style { style } => {
            app.update_state(|s| {
                s.settings.target_style = style.trim().to_string();
                Ok(())
            })
            .await?
        }
        SettingsCommand::Concurrency { limit } => {
            app.update_state(|s| {
                s.settings.concurrency_limit = limit.max(1);
                Ok(())
            })
            .await?
        }
        SettingsCommand::Key { provider, key } => {
            let provider = parse_provider(&provider)?;
            app.update_state(|s| Ok(s.settings.api_keys.set(provider, key.trim())?))
                .await?
        }
        SettingsCommand::Generator {
            provider,
            model,
            base_url,
        } => {
            let parsed = parse_provider(&provider)?;
            check_base_url(parsed, &base_url);
            app.update_state(|s| {
                s.settings.models.generator_provider = parsed.as_str().to_string();
                s.settings.models.generator_model = model;
                s.settings.models.generator_base_url = base_url;
                Ok(())
            })
            .await?
        }
        SettingsCommand::Validator {
            provider,
            model,
            base_url,
        } => {
            let parsed = parse_provider(&provider)?;
            check_base_url(parsed, &base_url);
            app.update_state(|s| {
                s.settings.models.validator_provider = parsed.as_str().to_string();
                s.settings.models.validator_model = model;
                s.settings.models.validator_base_url = base_url;
                Ok(())
            })
            .await?
        }
    };

    info!("✓ 设置已保存至: {}", app.config().storage_path);
    print_settings(&state);
    Ok(())
}

async fn examples_command(app: &App, command: ExamplesCommand) -> Result<()> {
    match command {
        ExamplesCommand::List => {
            let state = app.load_state().await?;
            if state.examples.is_empty() {
                println!("没有示例");
            }
            for example in &state.examples {
                println!("[{}]\n  原文: {}\n  期望: {}", example.id, example.original, example.expected);
            }
        }
        ExamplesCommand::Add { original, expected } => {
            let mut id = String::new();
            app.update_state(|s| {
                id = s.add_example(&original, &expected)?;
                Ok(())
            })
            .await?;
            info!("✓ 已添加示例: {}", id);
        }
        ExamplesCommand::Update {
            id,
            original,
            expected,
        } => {
            app.update_state(|s| Ok(s.update_example(&id, original.as_deref(), expected.as_deref())?))
                .await?;
            info!("✓ 已修改示例: {}", id);
        }
        ExamplesCommand::Remove { id } => {
            app.update_state(|s| Ok(s.remove_example(&id).map(|_| ())?))
                .await?;
            info!("✓ 已删除示例: {}", id);
        }
    }
    Ok(())
}

fn print_settings(state: &SavedState) {
    let settings = &state.settings;
    let models = &settings.models;
    println!("目标格式: {}", settings.target_style);
    println!("并发数:   {}", settings.effective_concurrency());
    println!(
        "生成器:   {}/{}{}",
        models.generator_provider,
        models.generator_model,
        models
            .generator_base_url
            .as_deref()
            .map(|u| format!(" ({})", u))
            .unwrap_or_default()
    );
    println!(
        "校验器:   {}/{}{}",
        models.validator_provider,
        models.validator_model,
        models
            .validator_base_url
            .as_deref()
            .map(|u| format!(" ({})", u))
            .unwrap_or_default()
    );
    println!("API Key:");
    for provider in Provider::ALL.into_iter().filter(|p| p.requires_api_key()) {
        let status = if settings.api_keys.get(provider).is_some() {
            "已配置"
        } else {
            "未配置"
        };
        let models = provider.suggested_models();
        if models.is_empty() {
            println!("  {:<10} {}", provider.as_str(), status);
        } else {
            println!(
                "  {:<10} {}  推荐模型: {}",
                provider.as_str(),
                status,
                models.join(", ")
            );
        }
    }
    println!("示例数量: {}", state.examples.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "biblio_fixer",
            "--storage",
            "state.toml",
            "run",
            "refs.txt",
            "-o",
            "out.txt",
        ]);
        match &cli.command {
            Command::Run { input, output, report } => {
                assert_eq!(input, &PathBuf::from("refs.txt"));
                assert_eq!(output.as_deref(), Some(std::path::Path::new("out.txt")));
                assert!(report.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.storage_path, "state.toml");
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(parse_provider("Mistral").unwrap(), Provider::Mistral);
        assert!(parse_provider("unknown").is_err());
    }
}
