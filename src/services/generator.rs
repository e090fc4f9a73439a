//! 生成器 - 业务能力层
//!
//! 只负责"把一条书目改写成目标格式"，不关心重试流程

use async_trait::async_trait;
use tracing::debug;

use crate::clients::LlmClient;
use crate::error::AppResult;
use crate::models::{Example, ProviderConfig};
use crate::services::prompts;
use crate::utils::logging::truncate_text;

/// 生成请求
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// 原始书目
    pub text: String,
    pub target_style: String,
    pub examples: Vec<Example>,
    pub provider_config: ProviderConfig,
    /// 上一轮校验失败的意见
    pub feedback: Option<String>,
    /// 上一轮的生成结果
    pub previous_attempt: Option<String>,
}

/// 生成能力
#[async_trait]
pub trait Generator: Send + Sync {
    /// 返回改写后的文本
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String>;
}

/// 基于 LLM 的生成器
pub struct LlmGenerator {
    client: LlmClient,
}

impl LlmGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, request: &GenerateRequest) -> AppResult<String> {
        let (system_message, user_message) = prompts::build_generation_messages(request);
        let text = self
            .client
            .chat(&request.provider_config, Some(&system_message), &user_message)
            .await?;
        debug!("生成结果: {}", truncate_text(&text, 80));
        Ok(text)
    }
}
