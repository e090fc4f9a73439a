//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 把待处理的条目按并发数分批：批内并发，批与批之间严格串行，
//! 上一批全部结束（成功或失败）后才开始下一批。
//!
//! ## 设计特点
//!
//! - **不做业务判断**：重试完全由 `EntryFlow` 负责，这里没有批量级别的重试
//! - **错误隔离**：单个条目失败不会中断整批
//! - **状态可观察**：`is_processing()` 从开始到最后一批结束为 true

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, warn};

use crate::models::{EntryPatch, EntryStatus};
use crate::utils::logging::{log_batch_complete, log_batch_start, log_entries_loaded};
use crate::workflow::{EntryFlow, ProcessOutcome};

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    /// 校验通过（或单独校验通过）
    pub valid: usize,
    /// 未配置校验器直接完成
    pub unvalidated: usize,
    /// 重试用完或单独校验未通过
    pub needs_review: usize,
    pub failed: usize,
    /// 跳过（正在处理、不存在、无内容）
    pub skipped: usize,
    /// 批次数量
    pub batches: usize,
}

impl BatchStats {
    fn record(&mut self, outcome: &ProcessOutcome) {
        match outcome {
            ProcessOutcome::Valid { .. } | ProcessOutcome::Checked { is_valid: true } => self.valid += 1,
            ProcessOutcome::Unvalidated => self.unvalidated += 1,
            ProcessOutcome::RetryLimitReached | ProcessOutcome::Checked { is_valid: false } => {
                self.needs_review += 1
            }
            ProcessOutcome::Failed(_) => self.failed += 1,
            ProcessOutcome::Skipped | ProcessOutcome::NotFound | ProcessOutcome::AlreadyRunning => {
                self.skipped += 1
            }
        }
    }

    fn merge(&mut self, other: &BatchStats) {
        self.valid += other.valid;
        self.unvalidated += other.unvalidated;
        self.needs_review += other.needs_review;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    /// 正常完成的数量
    pub fn completed(&self) -> usize {
        self.valid + self.unvalidated + self.needs_review
    }
}

/// 离开作用域时把处理标记复位
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 批量处理器
pub struct BatchProcessor {
    flow: Arc<EntryFlow>,
    concurrency_limit: usize,
    processing: AtomicBool,
}

impl BatchProcessor {
    /// 创建批量处理器，并发数取自流程的设置快照（0 视为 1）
    pub fn new(flow: Arc<EntryFlow>) -> Self {
        let concurrency_limit = flow.settings().effective_concurrency();
        Self {
            flow,
            concurrency_limit,
            processing: AtomicBool::new(false),
        }
    }

    pub fn flow(&self) -> &Arc<EntryFlow> {
        &self.flow
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// 是否正在批量处理
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// 处理所有状态不是 done 的条目
    pub async fn process_all(&self) -> BatchStats {
        let Some(_guard) = self.begin() else {
            return BatchStats::default();
        };

        let ids = self.flow.store().pending_ids().await;
        log_entries_loaded(ids.len(), self.concurrency_limit);

        self.run_in_batches(ids, |flow, id| async move { flow.process_entry(&id).await })
            .await
    }

    /// 对所有已有转换结果的条目做一次单独校验
    pub async fn validate_all(&self) -> BatchStats {
        let Some(_guard) = self.begin() else {
            return BatchStats::default();
        };

        let ids: Vec<String> = self
            .flow
            .store()
            .snapshot()
            .await
            .into_iter()
            .filter(|e| !e.converted.is_empty() && e.status != EntryStatus::Generating)
            .map(|e| e.id)
            .collect();
        log_entries_loaded(ids.len(), self.concurrency_limit);

        self.run_in_batches(ids, |flow, id| async move { flow.validate_entry(&id, None).await })
            .await
    }

    fn begin(&self) -> Option<ProcessingGuard<'_>> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("⚠️ 已有批量处理在进行中，忽略本次请求");
            return None;
        }
        Some(ProcessingGuard(&self.processing))
    }

    /// 分批执行：批内并发，批间串行
    async fn run_in_batches<F, Fut>(&self, ids: Vec<String>, task: F) -> BatchStats
    where
        F: Fn(Arc<EntryFlow>, String) -> Fut,
        Fut: Future<Output = ProcessOutcome> + Send + 'static,
    {
        let total = ids.len();
        let limit = self.concurrency_limit;
        let total_batches = total.div_ceil(limit);
        let mut stats = BatchStats {
            total,
            ..Default::default()
        };

        for (batch_index, batch_ids) in ids.chunks(limit).enumerate() {
            let batch_num = batch_index + 1;
            let batch_start = batch_index * limit;
            log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch_ids.len(),
                total,
            );

            let handles: Vec<_> = batch_ids
                .iter()
                .map(|id| tokio::spawn(task(Arc::clone(&self.flow), id.clone())))
                .collect();

            // 等待本批所有任务完成
            let results = join_all(handles).await;
            let mut batch_result = BatchStats::default();
            for (id, result) in batch_ids.iter().zip(results) {
                match result {
                    Ok(outcome) => batch_result.record(&outcome),
                    Err(e) => {
                        // 任务 panic 时流程来不及写回状态，这里补上
                        let message = format!("任务执行失败: {}", e);
                        error!("[条目 {}] ❌ {}", id, message);
                        self.flow
                            .store()
                            .update(id, EntryPatch::status(EntryStatus::Error).with_comment(message))
                            .await;
                        batch_result.failed += 1;
                    }
                }
            }

            log_batch_complete(batch_num, batch_result.completed(), batch_ids.len());
            stats.merge(&batch_result);
            stats.batches += 1;
        }

        stats
    }
}
