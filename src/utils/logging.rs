use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::orchestrator::BatchStats;

/// 初始化日志
///
/// # 参数
/// - `verbose`: 未设置 `RUST_LOG` 时是否使用 debug 级别
/// - `log_file_path`: 运行日志文件，为空则只输出到终端
pub fn init(verbose: bool, log_file_path: &str) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = if log_file_path.is_empty() {
        None
    } else {
        let file = init_log_file(log_file_path)?;
        Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("日志初始化失败")?;
    Ok(())
}

/// 初始化日志文件，写入带时间的文件头
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回以追加模式打开的文件
pub fn init_log_file(log_file_path: &str) -> Result<fs::File> {
    let log_header = format!(
        "{}\n书目格式化日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法创建日志文件: {}", log_file_path))?;
    fs::OpenOptions::new()
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))
}

/// 记录程序启动信息
pub fn log_startup(target_style: &str, generator: &str, validator: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 书目格式化");
    info!("📚 目标格式: {}", target_style);
    info!("✍️  生成器: {}", generator);
    info!("🔎 校验器: {}", validator);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录条目加载信息
///
/// # 参数
/// - `total`: 待处理条目数
/// - `max_concurrent`: 最大并发数
pub fn log_entries_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 条待处理的书目", total);
    info!("📋 将以每批 {} 条的方式处理", max_concurrent);
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始条目编号
/// - `end`: 结束条目编号
/// - `total`: 条目总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批条目: {}-{} / 共 {} 条", start, end, total);
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
}

/// 打印最终统计信息
///
/// # 参数
/// - `stats`: 处理统计
/// - `output_path`: 结果文件路径（没有导出时为 None）
pub fn print_final_stats(stats: &BatchStats, output_path: Option<&str>) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 校验通过: {}/{}", stats.valid, stats.total);
    if stats.unvalidated > 0 {
        info!("➖ 未校验: {}", stats.unvalidated);
    }
    info!("📝 需要人工检查: {}", stats.needs_review);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    if let Some(path) = output_path {
        info!("结果已保存至: {}", path);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
