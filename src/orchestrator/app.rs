//! 应用入口 - 编排层
//!
//! 负责资源的创建和生命周期：加载设置快照、创建 LLM 客户端和条目仓库、
//! 委托 `BatchProcessor` 执行，最后导出结果

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::infrastructure::EntryStore;
use crate::models::{self, EntryStatus, SavedState};
use crate::orchestrator::batch_processor::{BatchProcessor, BatchStats};
use crate::services::{LlmGenerator, LlmValidator};
use crate::utils::logging::{log_startup, print_final_stats, truncate_text};
use crate::workflow::EntryFlow;

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.config.storage_path)
    }

    /// 加载设置和示例
    pub async fn load_state(&self) -> Result<SavedState> {
        models::load_saved_state(&self.storage_path()).await
    }

    /// 保存设置和示例
    pub async fn save_state(&self, state: &SavedState) -> Result<()> {
        models::save_saved_state(&self.storage_path(), state).await
    }

    /// 读取、修改并保存持久化状态
    pub async fn update_state<F>(&self, update: F) -> Result<SavedState>
    where
        F: FnOnce(&mut SavedState) -> Result<()>,
    {
        let mut state = self.load_state().await?;
        update(&mut state)?;
        self.save_state(&state).await?;
        Ok(state)
    }

    /// 用当前设置快照创建处理流程
    async fn build_flow(&self, store: Arc<EntryStore>) -> Result<Arc<EntryFlow>> {
        let state = self.load_state().await?;
        let mut settings = state.settings;
        settings.api_keys.fill_from_env();

        log_startup(
            &settings.target_style,
            &format!("{}/{}", settings.models.generator_provider, settings.models.generator_model),
            &format!("{}/{}", settings.models.validator_provider, settings.models.validator_model),
            settings.effective_concurrency(),
        );
        if !settings.validator_config().is_usable().unwrap_or(true) {
            warn!("⚠️ 未配置校验器的 API Key，生成结果将不经校验直接完成");
        }

        let client = LlmClient::new(&self.config).context("无法创建 HTTP 客户端")?;
        Ok(Arc::new(EntryFlow::new(
            store,
            Arc::new(LlmGenerator::new(client.clone())),
            Arc::new(LlmValidator::new(client)),
            settings,
            state.examples,
        )))
    }

    /// 转换文件中的所有书目
    ///
    /// # 参数
    /// - `input`: 书目文件（每行一条）
    /// - `output`: 结果文件，默认使用配置中的路径
    /// - `report`: 可选的 JSON 报告路径
    pub async fn run(&self, input: &Path, output: Option<&Path>, report: Option<&Path>) -> Result<BatchStats> {
        let lines = models::load_entry_lines(input).await?;
        if lines.is_empty() {
            warn!("⚠️ 没有找到待处理的书目，程序结束");
            return Ok(BatchStats::default());
        }

        let store = Arc::new(EntryStore::new());
        store.add_entries(&lines).await;

        let processor = BatchProcessor::new(self.build_flow(Arc::clone(&store)).await?);
        let progress = spawn_progress_watcher(Arc::clone(&store));
        let stats = processor.process_all().await;
        progress.abort();

        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.output_file));
        let written = self.export(&store, &output, report).await?;

        print_final_stats(&stats, written.then(|| output.to_str()).flatten());
        Ok(stats)
    }

    /// 校验已有的转换结果（不重新生成）
    ///
    /// 两个文件按行一一对应
    pub async fn check(&self, originals: &Path, converted: &Path, report: Option<&Path>) -> Result<BatchStats> {
        let original_lines = models::load_entry_lines(originals).await?;
        let converted_lines = models::load_entry_lines(converted).await?;
        if original_lines.len() != converted_lines.len() {
            bail!(
                "原文 {} 条与转换结果 {} 条数量不一致",
                original_lines.len(),
                converted_lines.len()
            );
        }

        let store = Arc::new(EntryStore::new());
        let ids = store.add_entries(&original_lines).await;
        for (id, text) in ids.iter().zip(&converted_lines) {
            store.set_converted(id, text.as_str()).await;
        }

        let processor = BatchProcessor::new(self.build_flow(Arc::clone(&store)).await?);
        let stats = processor.validate_all().await;

        if let Some(report) = report {
            write_report(report, &store).await?;
        }
        log_entry_issues(&store).await;
        print_final_stats(&stats, None);
        Ok(stats)
    }

    async fn export(&self, store: &EntryStore, output: &Path, report: Option<&Path>) -> Result<bool> {
        let written = models::loaders::write_output(output, &store.snapshot().await).await?;
        if let Some(report) = report {
            write_report(report, store).await?;
        }
        log_entry_issues(store).await;
        Ok(written)
    }
}

/// 写出所有条目的 JSON 报告
async fn write_report(path: &Path, store: &EntryStore) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.snapshot().await)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("无法写入报告文件: {}", path.display()))?;
    info!("📄 报告已保存至: {}", path.display());
    Ok(())
}

/// 列出失败和需要人工检查的条目
async fn log_entry_issues(store: &EntryStore) {
    for (index, entry) in store.snapshot().await.iter().enumerate() {
        let comment = entry.validation_comment.as_deref().unwrap_or_default();
        match entry.status {
            EntryStatus::Error => warn!(
                "❌ 第 {} 条失败: {} ({})",
                index + 1,
                truncate_text(&entry.original, 60),
                comment
            ),
            EntryStatus::Done if !comment.is_empty() || !entry.is_fully_valid() => {
                if entry.validator_style.is_some() {
                    warn!(
                        "📝 第 {} 条需要检查: {} {}",
                        index + 1,
                        truncate_text(&entry.converted, 60),
                        comment
                    );
                }
            }
            _ => {}
        }
    }
}

/// 条目变化时输出进度
fn spawn_progress_watcher(store: Arc<EntryStore>) -> JoinHandle<()> {
    let mut revision = store.subscribe();
    tokio::spawn(async move {
        let mut last = None;
        while revision.changed().await.is_ok() {
            let counts = store.status_counts().await;
            if last != Some(counts) {
                debug!(
                    "进度: 完成 {} / 处理中 {} / 等待 {} / 错误 {}",
                    counts.done,
                    counts.active(),
                    counts.idle,
                    counts.error
                );
                last = Some(counts);
            }
        }
    })
}
