pub mod anthropic_client;
pub mod llm_client;

pub use anthropic_client::AnthropicClient;
pub use llm_client::LlmClient;
