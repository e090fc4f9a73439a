//! 条目处理流程 - 流程层
//!
//! 核心职责：定义"一条书目"的完整处理流程
//!
//! 每一轮：
//! 1. generating：调用生成器（带上一轮的校验意见）
//! 2. validating：并发调用两个校验器（style / integrity）
//! 3. 两个都通过 → done；否则带着意见进入下一轮
//!
//! 最多三轮。用完仍未通过时保留最后一次结果并标记为 done（附说明），
//! 不算错误；生成或校验调用本身出错才会进入 error。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::EntryStore;
use crate::models::{Entry, EntryPatch, EntryStatus, Example, ProviderConfig, Settings, ValidationResult};
use crate::services::{GenerateRequest, Generator, ValidateRequest, ValidationMode, Validator};
use crate::utils::logging::truncate_text;

/// 每条书目的最大尝试次数
pub const MAX_ATTEMPTS: usize = 3;

/// 重试次数用完时附加在条目上的说明
pub const RETRY_LIMIT_ANNOTATION: &str = "已达到修正重试上限，请手动检查结果。";

/// 条目处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// 两个校验器都通过
    Valid { attempts: usize },
    /// 没有配置校验器，生成后直接完成
    Unvalidated,
    /// 重试次数用完，保留最后一次结果
    RetryLimitReached,
    /// 单独校验完成
    Checked { is_valid: bool },
    /// 没有可校验的内容或没有校验器
    Skipped,
    /// 出错，附带错误信息
    Failed(String),
    /// 条目不存在
    NotFound,
    /// 同一条目已有处理流程在运行
    AlreadyRunning,
}

/// 条目处理流程
///
/// - 不持有条目，只通过 `EntryStore` 读写
/// - 设置和示例是创建时的快照，之后的修改不影响正在进行的调用
pub struct EntryFlow {
    store: Arc<EntryStore>,
    generator: Arc<dyn Generator>,
    validator: Arc<dyn Validator>,
    settings: Arc<Settings>,
    examples: Arc<Vec<Example>>,
}

impl EntryFlow {
    pub fn new(
        store: Arc<EntryStore>,
        generator: Arc<dyn Generator>,
        validator: Arc<dyn Validator>,
        settings: Settings,
        examples: Vec<Example>,
    ) -> Self {
        Self {
            store,
            generator,
            validator,
            settings: Arc::new(settings),
            examples: Arc::new(examples),
        }
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 处理单个条目：生成 → 校验 → 重试
    pub async fn process_entry(&self, id: &str) -> ProcessOutcome {
        let Some(_claim) = self.store.try_claim(id) else {
            warn!("[条目 {}] 已在处理中，忽略重复请求", short_id(id));
            return ProcessOutcome::AlreadyRunning;
        };

        let Some(entry) = self.store.get(id).await else {
            warn!("[条目 {}] 不存在", short_id(id));
            return ProcessOutcome::NotFound;
        };

        match self.run_attempts(&entry).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail(id, e.to_string()).await,
        }
    }

    async fn run_attempts(&self, entry: &Entry) -> AppResult<ProcessOutcome> {
        let id = entry.id.as_str();

        // 配置错误在任何网络调用之前暴露
        let generator_config = self.settings.generator_config();
        generator_config.ensure_usable()?;
        let validator_config = self.settings.validator_config();
        let should_validate = validator_config.is_usable()?;

        let mut feedback: Option<String> = None;
        let mut previous_attempt: Option<String> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let patch = EntryPatch::status(EntryStatus::Generating);
            let patch = if attempt > 1 {
                patch.with_comment(format!("修正中 {}/{}...", attempt, MAX_ATTEMPTS))
            } else {
                patch.clear_comment()
            };
            self.store.update(id, patch).await;

            debug!("[条目 {}] 第 {}/{} 次生成", short_id(id), attempt, MAX_ATTEMPTS);
            let request = GenerateRequest {
                text: entry.original.clone(),
                target_style: self.settings.target_style.clone(),
                examples: self.examples.as_ref().clone(),
                provider_config: generator_config.clone(),
                feedback: feedback.take(),
                previous_attempt: previous_attempt.take(),
            };
            let converted = self.generator.generate(&request).await?;

            self.store
                .update(
                    id,
                    EntryPatch::status(EntryStatus::Validating).with_converted(converted.clone()),
                )
                .await;

            if !should_validate {
                info!("[条目 {}] 未配置校验器，直接完成", short_id(id));
                self.store.update(id, EntryPatch::status(EntryStatus::Done)).await;
                return Ok(ProcessOutcome::Unvalidated);
            }

            let (style, integrity) = self
                .validate_pair(&entry.original, &converted, &validator_config)
                .await?;
            let fully_valid = style.is_valid && integrity.is_valid;
            let round_feedback = build_feedback(&style, &integrity);

            self.store
                .update(id, EntryPatch::default().with_validation(style, integrity))
                .await;

            if fully_valid {
                info!(
                    "[条目 {}] ✓ 第 {} 次尝试通过校验: {}",
                    short_id(id),
                    attempt,
                    truncate_text(&converted, 60)
                );
                self.store
                    .update(id, EntryPatch::status(EntryStatus::Done).clear_comment())
                    .await;
                return Ok(ProcessOutcome::Valid { attempts: attempt });
            }

            debug!("[条目 {}] 校验未通过: {}", short_id(id), round_feedback);
            feedback = Some(round_feedback);
            previous_attempt = Some(converted);
        }

        warn!("[条目 {}] ⚠️ 重试 {} 次后仍未通过校验", short_id(id), MAX_ATTEMPTS);
        self.store
            .update(
                id,
                EntryPatch::status(EntryStatus::Done).with_comment(RETRY_LIMIT_ANNOTATION),
            )
            .await;
        Ok(ProcessOutcome::RetryLimitReached)
    }

    /// 并发执行 style 和 integrity 两个校验
    async fn validate_pair(
        &self,
        original: &str,
        converted: &str,
        provider_config: &ProviderConfig,
    ) -> AppResult<(ValidationResult, ValidationResult)> {
        let request = |mode| ValidateRequest {
            original: original.to_string(),
            converted: converted.to_string(),
            style: self.settings.target_style.clone(),
            mode,
            provider_config: provider_config.clone(),
        };
        let style_request = request(ValidationMode::Style);
        let integrity_request = request(ValidationMode::Integrity);

        tokio::try_join!(
            self.validator.validate(&style_request),
            self.validator.validate(&integrity_request)
        )
    }

    /// 单独校验一个条目（不重新生成）
    ///
    /// # 参数
    /// - `id`: 条目 id
    /// - `converted`: 要校验的文本，`None` 时使用条目当前的转换结果
    pub async fn validate_entry(&self, id: &str, converted: Option<&str>) -> ProcessOutcome {
        let Some(_claim) = self.store.try_claim(id) else {
            return ProcessOutcome::AlreadyRunning;
        };
        let Some(entry) = self.store.get(id).await else {
            return ProcessOutcome::NotFound;
        };

        let text = converted.unwrap_or(entry.converted.as_str());
        if text.is_empty() {
            return ProcessOutcome::Skipped;
        }

        let validator_config = self.settings.validator_config();
        match validator_config.is_usable() {
            Ok(true) => {}
            Ok(false) => {
                debug!("[条目 {}] 未配置校验器，跳过校验", short_id(id));
                return ProcessOutcome::Skipped;
            }
            Err(e) => return self.fail(id, e.to_string()).await,
        }

        self.store.update(id, EntryPatch::status(EntryStatus::Validating)).await;

        match self.validate_pair(&entry.original, text, &validator_config).await {
            Ok((style, integrity)) => {
                let is_valid = style.is_valid && integrity.is_valid;
                self.store
                    .update(
                        id,
                        EntryPatch::status(EntryStatus::Done).with_validation(style, integrity),
                    )
                    .await;
                ProcessOutcome::Checked { is_valid }
            }
            Err(e) => self.fail(id, e.to_string()).await,
        }
    }

    async fn fail(&self, id: &str, message: String) -> ProcessOutcome {
        error!("[条目 {}] ❌ 处理失败: {}", short_id(id), message);
        self.store
            .update(
                id,
                EntryPatch::status(EntryStatus::Error).with_comment(message.clone()),
            )
            .await;
        ProcessOutcome::Failed(message)
    }
}

/// 把未通过的校验意见拼成下一轮的反馈
///
/// 通过的校验器不产生任何内容
pub fn build_feedback(style: &ValidationResult, integrity: &ValidationResult) -> String {
    [
        (ValidationMode::Style, style),
        (ValidationMode::Integrity, integrity),
    ]
    .into_iter()
    .filter(|(_, result)| !result.is_valid)
    .map(|(mode, result)| format!("{}: {}", mode.feedback_label(), result.comment))
    .collect::<Vec<_>>()
    .join(". ")
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(comment: &str) -> ValidationResult {
        ValidationResult::new(true, 9, comment)
    }

    fn fail(comment: &str) -> ValidationResult {
        ValidationResult::new(false, 3, comment)
    }

    #[test]
    fn test_feedback_style_only() {
        assert_eq!(
            build_feedback(&fail("journal not italic"), &pass("ok")),
            "Style: journal not italic"
        );
    }

    #[test]
    fn test_feedback_integrity_only() {
        assert_eq!(
            build_feedback(&pass("ok"), &fail("year changed")),
            "Integrity: year changed"
        );
    }

    #[test]
    fn test_feedback_both() {
        assert_eq!(
            build_feedback(&fail("order"), &fail("pages lost")),
            "Style: order. Integrity: pages lost"
        );
    }

    #[test]
    fn test_feedback_none() {
        assert_eq!(build_feedback(&pass("a"), &pass("b")), "");
    }
}
