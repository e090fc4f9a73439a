/// 程序运行配置
///
/// 与用户设置（目标格式、API Key 等，见 `models::Settings`）不同，
/// 这里只包含运行环境相关的参数
#[derive(Clone, Debug)]
pub struct Config {
    /// 设置和示例的存储文件
    pub storage_path: String,
    /// 转换结果输出文件
    pub output_file: String,
    /// 运行日志文件（为空则不写文件）
    pub log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 调用参数 ---
    pub http_timeout_secs: u64,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: "biblio-fixer-storage.toml".to_string(),
            output_file: "bibliografia-output.txt".to_string(),
            log_file: String::new(),
            verbose_logging: false,
            http_timeout_secs: 120,
            llm_temperature: 0.3,
            llm_max_tokens: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            storage_path: std::env::var("BIBLIO_STORAGE_PATH").unwrap_or(default.storage_path),
            output_file: std::env::var("BIBLIO_OUTPUT_FILE").unwrap_or(default.output_file),
            log_file: std::env::var("BIBLIO_LOG_FILE").unwrap_or(default.log_file),
            verbose_logging: std::env::var("BIBLIO_VERBOSE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            http_timeout_secs: std::env::var("BIBLIO_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.http_timeout_secs),
            llm_temperature: std::env::var("BIBLIO_LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            llm_max_tokens: std::env::var("BIBLIO_LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_tokens),
        }
    }
}
