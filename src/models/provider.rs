/// LLM 提供商枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI
    OpenAi,
    /// Google Gemini
    Google,
    /// Anthropic Claude
    Anthropic,
    /// Mistral
    Mistral,
    /// 兼容 OpenAI API 的本地服务（LM Studio、Ollama 等），需要 base URL，不需要密钥
    Custom,
}

/// 标识 → 提供商
static PROVIDERS: phf::Map<&'static str, Provider> = phf::phf_map! {
    "openai" => Provider::OpenAi,
    "google" => Provider::Google,
    "anthropic" => Provider::Anthropic,
    "mistral" => Provider::Mistral,
    "custom" => Provider::Custom,
};

/// 各提供商的推荐模型
static SUGGESTED_MODELS: phf::Map<&'static str, &'static [&'static str]> = phf::phf_map! {
    "openai" => &["gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
    "google" => &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-pro"],
    "anthropic" => &[
        "claude-3-5-sonnet-20240620",
        "claude-3-opus-20240229",
        "claude-3-haiku-20240307",
    ],
};

impl Provider {
    /// 所有提供商
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Google,
        Provider::Anthropic,
        Provider::Mistral,
        Provider::Custom,
    ];

    /// 从标识解析提供商
    pub fn from_str(name: &str) -> Option<Self> {
        PROVIDERS.get(name.trim().to_lowercase().as_str()).copied()
    }

    /// 获取标识
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Google => "google",
            Provider::Anthropic => "anthropic",
            Provider::Mistral => "mistral",
            Provider::Custom => "custom",
        }
    }

    /// 是否需要 API Key
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Provider::Custom)
    }

    /// 默认 API 地址；custom 没有默认值
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1"),
            Provider::Google => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Provider::Anthropic => Some("https://api.anthropic.com/v1"),
            Provider::Mistral => Some("https://api.mistral.ai/v1"),
            Provider::Custom => None,
        }
    }

    /// 推荐模型列表
    pub fn suggested_models(self) -> &'static [&'static str] {
        SUGGESTED_MODELS.get(self.as_str()).copied().unwrap_or(&[])
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
