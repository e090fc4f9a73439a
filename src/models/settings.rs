//! 用户设置：目标格式、并发数、API Key、生成器/校验器模型
//!
//! 对处理流程来说设置是只读的，每次批量运行前取一份快照

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::provider::Provider;

/// 用户设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 目标格式，例如 "Nature"、"APA 7th"
    pub target_style: String,
    /// 每批同时处理的条目数量
    pub concurrency_limit: usize,
    pub api_keys: ApiKeys,
    pub models: ModelSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_style: "Nature".to_string(),
            concurrency_limit: 1,
            api_keys: ApiKeys::default(),
            models: ModelSettings::default(),
        }
    }
}

/// 各提供商的 API Key，空字符串表示未配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: String,
    pub google: String,
    pub anthropic: String,
    pub mistral: String,
}

impl ApiKeys {
    /// 获取提供商对应的密钥；custom 没有密钥
    pub fn get(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAi => &self.openai,
            Provider::Google => &self.google,
            Provider::Anthropic => &self.anthropic,
            Provider::Mistral => &self.mistral,
            Provider::Custom => return None,
        };
        Some(key.as_str()).filter(|k| !k.trim().is_empty())
    }

    /// 设置提供商对应的密钥
    pub fn set(&mut self, provider: Provider, key: impl Into<String>) -> AppResult<()> {
        let slot = match provider {
            Provider::OpenAi => &mut self.openai,
            Provider::Google => &mut self.google,
            Provider::Anthropic => &mut self.anthropic,
            Provider::Mistral => &mut self.mistral,
            Provider::Custom => {
                return Err(ConfigError::KeylessProvider {
                    provider: provider.as_str().to_string(),
                }
                .into())
            }
        };
        *slot = key.into();
        Ok(())
    }

    /// 用环境变量补全未配置的密钥（不会写回存储）
    pub fn fill_from_env(&mut self) {
        let slots = [
            (&mut self.openai, "OPENAI_API_KEY"),
            (&mut self.google, "GOOGLE_API_KEY"),
            (&mut self.anthropic, "ANTHROPIC_API_KEY"),
            (&mut self.mistral, "MISTRAL_API_KEY"),
        ];
        for (slot, var_name) in slots {
            if slot.trim().is_empty() {
                if let Ok(value) = std::env::var(var_name) {
                    *slot = value;
                }
            }
        }
    }
}

/// 生成器 / 校验器的模型配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub generator_provider: String,
    pub generator_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_base_url: Option<String>,
    pub validator_provider: String,
    pub validator_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_base_url: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            generator_provider: "openai".to_string(),
            generator_model: "gpt-4o".to_string(),
            generator_base_url: None,
            validator_provider: "anthropic".to_string(),
            validator_model: "claude-3-5-sonnet-20240620".to_string(),
            validator_base_url: None,
        }
    }
}

/// 一次 LLM 调用所需的提供商配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: String,
    pub model: String,
    /// 空字符串表示未配置
    pub api_key: String,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// 解析提供商标识
    pub fn resolve_provider(&self) -> AppResult<Provider> {
        Provider::from_str(&self.provider).ok_or_else(|| {
            ConfigError::InvalidProvider {
                name: self.provider.clone(),
            }
            .into()
        })
    }

    /// 是否可以发起调用：提供商有效，且有密钥或者是 custom
    ///
    /// 提供商无效时返回配置错误
    pub fn is_usable(&self) -> AppResult<bool> {
        let provider = self.resolve_provider()?;
        Ok(!provider.requires_api_key() || !self.api_key.trim().is_empty())
    }

    /// 确认可以发起调用，否则返回配置错误
    pub fn ensure_usable(&self) -> AppResult<Provider> {
        let provider = self.resolve_provider()?;
        if provider.requires_api_key() && self.api_key.trim().is_empty() {
            return Err(AppError::missing_api_key(self.provider.as_str()));
        }
        Ok(provider)
    }
}

impl Settings {
    /// 并发数，0 视为 1
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency_limit.max(1)
    }

    pub fn generator_config(&self) -> ProviderConfig {
        self.provider_config(
            &self.models.generator_provider,
            &self.models.generator_model,
            self.models.generator_base_url.as_deref(),
        )
    }

    pub fn validator_config(&self) -> ProviderConfig {
        self.provider_config(
            &self.models.validator_provider,
            &self.models.validator_model,
            self.models.validator_base_url.as_deref(),
        )
    }

    fn provider_config(&self, provider: &str, model: &str, base_url: Option<&str>) -> ProviderConfig {
        let api_key = Provider::from_str(provider)
            .and_then(|p| self.api_keys.get(p))
            .unwrap_or_default()
            .to_string();

        ProviderConfig {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key,
            base_url: base_url.map(str::to_string).filter(|u| !u.trim().is_empty()),
        }
    }
}
