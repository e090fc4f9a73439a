//! 校验器 - 业务能力层
//!
//! 对候选文本给出通过/不通过、0-10 分和一句评语，分两个维度：
//! 格式规范（style）和信息完整（integrity）

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::LlmClient;
use crate::error::{AppResult, LlmError};
use crate::models::{ProviderConfig, ValidationResult};
use crate::services::prompts;

/// 校验维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Style,
    Integrity,
}

impl ValidationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationMode::Style => "style",
            ValidationMode::Integrity => "integrity",
        }
    }

    /// 反馈意见里使用的前缀
    pub fn feedback_label(self) -> &'static str {
        match self {
            ValidationMode::Style => "Style",
            ValidationMode::Integrity => "Integrity",
        }
    }
}

/// 校验请求
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    pub original: String,
    pub converted: String,
    /// 目标格式
    pub style: String,
    pub mode: ValidationMode,
    pub provider_config: ProviderConfig,
}

/// 校验能力
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, request: &ValidateRequest) -> AppResult<ValidationResult>;
}

/// 基于 LLM 的校验器
pub struct LlmValidator {
    client: LlmClient,
}

impl LlmValidator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Validator for LlmValidator {
    async fn validate(&self, request: &ValidateRequest) -> AppResult<ValidationResult> {
        let prompt = prompts::build_validation_prompt(request);
        let response = self
            .client
            .chat(&request.provider_config, None, &prompt)
            .await?;

        let result = parse_verdict(&response)?;
        debug!(
            "校验 [{}]: 通过={} 分数={}",
            request.mode.as_str(),
            result.is_valid,
            result.score
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(alias = "isValid", alias = "is_valid")]
    valid: bool,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    comment: String,
}

fn object_start_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\{\s*""#).expect("valid regex"))
}

/// 解析校验器的回复
///
/// 模型经常在 JSON 外面包一层 markdown 代码块或说明文字，有时还会先复述格式模板。
/// 依次尝试回复中每个以键开头的 JSON 对象，取第一个能解析为校验结果的；
/// 分数四舍五入并限制在 0-10
pub fn parse_verdict(response: &str) -> AppResult<ValidationResult> {
    let mut last_error = None;

    for candidate in object_start_regex().find_iter(response) {
        let mut stream =
            serde_json::Deserializer::from_str(&response[candidate.start()..]).into_iter::<RawVerdict>();
        match stream.next() {
            Some(Ok(raw)) => return Ok(raw.into_result()),
            Some(Err(e)) => last_error = Some(e),
            None => {}
        }
    }

    match last_error {
        Some(e) => {
            warn!("无法解析校验结果: {}", e);
            Err(e.into())
        }
        None => Err(LlmError::VerdictParseFailed {
            response: response.to_string(),
        }
        .into()),
    }
}

impl RawVerdict {
    fn into_result(self) -> ValidationResult {
        let score = if self.score.is_finite() {
            self.score.round().clamp(0.0, 10.0) as u8
        } else {
            0
        };
        ValidationResult::new(self.valid, score, self.comment.trim())
    }
}
