use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（缺少 API Key、无效的提供商等），在任何网络调用之前发现
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// LLM 服务错误（网络失败、上游返回错误等）
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 条目或示例相关错误
    #[error("数据错误: {0}")]
    Entry(#[from] EntryError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 需要密钥的提供商没有配置 API Key
    #[error("缺少 API Key (提供商: {provider})")]
    MissingApiKey { provider: String },
    /// 无法识别的提供商标识
    #[error("无效的提供商: {name}")]
    InvalidProvider { name: String },
    /// custom 提供商必须配置 base URL
    #[error("提供商 {provider} 需要配置 base URL")]
    MissingBaseUrl { provider: String },
    /// 不使用密钥的提供商
    #[error("提供商 {provider} 不使用 API Key")]
    KeylessProvider { provider: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// API 返回非成功状态码
    #[error("LLM API返回错误响应 (状态码: {status}): {message}")]
    BadResponse { status: u16, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 校验结果无法解析
    #[error("无法解析校验结果 (响应: {response})")]
    VerdictParseFailed { response: String },
    /// 网络错误
    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),
    /// 校验结果 JSON 字段不符合要求
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 条目 / 示例错误
#[derive(Debug, Error)]
pub enum EntryError {
    /// 示例不存在
    #[error("示例不存在: {id}")]
    ExampleNotFound { id: String },
    /// 示例内容为空
    #[error("示例的原文和期望结果都不能为空")]
    EmptyExample,
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Llm(LlmError::Network(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Llm(LlmError::Json(err))
    }
}

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: String::new(),
            message: err.to_string(),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            message: message.to_string(),
        })
    }

    /// 创建缺少 API Key 错误
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingApiKey {
            provider: provider.into(),
        })
    }

    /// 是否属于配置错误
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = AppError::missing_api_key("openai");
        assert!(err.is_config());
        assert_eq!(err.to_string(), "配置错误: 缺少 API Key (提供商: openai)");
    }

    #[test]
    fn test_json_error_converts_to_llm_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AppError = source.into();
        assert!(matches!(err, AppError::Llm(LlmError::Json(_))));
        assert!(err.to_string().starts_with("LLM错误: JSON解析失败"));
    }

    #[test]
    fn test_llm_error_is_not_config() {
        let err = AppError::llm_api_failed("gpt-4o", "timeout");
        assert!(!err.is_config());
        assert!(err.to_string().contains("gpt-4o"));
        assert!(err.to_string().contains("timeout"));
    }
}
