/// LLM API 客户端
///
/// 按提供商分发调用：
/// - openai / google / mistral / custom 走兼容 OpenAI 的接口（`async-openai`）
/// - anthropic 走原生 Messages API（`reqwest`）
use crate::clients::anthropic_client::AnthropicClient;
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError, LlmError};
use crate::models::{Provider, ProviderConfig};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Duration;
use tracing::{debug, warn};

/// custom 提供商没有密钥时使用的占位值
const PLACEHOLDER_API_KEY: &str = "dummy";

/// LLM 客户端
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        })
    }

    /// 发送聊天请求
    ///
    /// # 参数
    /// - `provider_config`: 提供商、模型、密钥
    /// - `system_message`: 系统消息（可选）
    /// - `user_message`: 用户消息内容
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已 trim）
    pub async fn chat(
        &self,
        provider_config: &ProviderConfig,
        system_message: Option<&str>,
        user_message: &str,
    ) -> AppResult<String> {
        let provider = provider_config.ensure_usable()?;
        let base_url = resolve_base_url(provider, provider_config)?;

        debug!(
            "调用 LLM API，提供商: {}，模型: {}",
            provider, provider_config.model
        );
        debug!("用户消息长度: {} 字符", user_message.len());

        match provider {
            Provider::Anthropic => {
                AnthropicClient {
                    http: &self.http,
                    api_key: &provider_config.api_key,
                    base_url,
                    model: &provider_config.model,
                    max_tokens: self.max_tokens,
                    temperature: self.temperature,
                }
                .send(system_message, user_message)
                .await
            }
            _ => {
                let api_key = if provider_config.api_key.trim().is_empty() {
                    PLACEHOLDER_API_KEY
                } else {
                    provider_config.api_key.as_str()
                };
                self.chat_openai_compatible(api_key, base_url, &provider_config.model, system_message, user_message)
                    .await
            }
        }
    }

    async fn chat_openai_compatible(
        &self,
        api_key: &str,
        base_url: &str,
        model: &str,
        system_message: Option<&str>,
        user_message: &str,
    ) -> AppResult<String> {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        let client = Client::with_config(openai_config);

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(model, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: model.to_string(),
            })?;

        Ok(content)
    }
}

/// custom 必须使用配置的 base URL，其他提供商使用官方地址
fn resolve_base_url(provider: Provider, provider_config: &ProviderConfig) -> AppResult<&str> {
    match provider.default_base_url() {
        Some(url) => Ok(url),
        None => provider_config.base_url.as_deref().ok_or_else(|| {
            ConfigError::MissingBaseUrl {
                provider: provider.as_str().to_string(),
            }
            .into()
        }),
    }
}
