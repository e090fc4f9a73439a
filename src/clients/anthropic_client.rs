//! Anthropic Messages API 客户端
//!
//! Anthropic 没有兼容 OpenAI 的接口，这里直接用 reqwest 调用原生 API

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, LlmError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// 单次调用的 Anthropic 客户端
pub struct AnthropicClient<'a> {
    pub http: &'a Client,
    pub api_key: &'a str,
    pub base_url: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnthropicClient<'_> {
    /// 构建请求体
    pub(crate) fn build_request_body(&self, system_message: Option<&str>, user_message: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": user_message }
            ],
        });
        if let Some(system) = system_message {
            body["system"] = serde_json::json!(system);
        }
        body
    }

    /// 发送消息，返回文本内容
    pub async fn send(&self, system_message: Option<&str>, user_message: &str) -> AppResult<String> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        debug!("调用 Anthropic API，模型: {}", self.model);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request_body(system_message, user_message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Anthropic API 返回错误 {}: {}", status, message);
            return Err(LlmError::BadResponse {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: MessagesResponse = response.json().await?;
        extract_text(body).ok_or_else(|| {
            AppError::Llm(LlmError::EmptyContent {
                model: self.model.to_string(),
            })
        })
    }
}

/// 拼接所有 text 块
fn extract_text(response: MessagesResponse) -> Option<String> {
    let text = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(http: &Client) -> AnthropicClient<'_> {
        AnthropicClient {
            http,
            api_key: "key",
            base_url: "https://api.anthropic.com/v1",
            model: "claude-3-haiku-20240307",
            max_tokens: 512,
            temperature: 0.3,
        }
    }

    #[test]
    fn test_request_body() {
        let http = Client::new();
        let body = client(&http).build_request_body(Some("sys"), "Format this entry:\nX");

        assert_eq!(body["model"], "claude-3-haiku-20240307");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Format this entry:\nX");
    }

    #[test]
    fn test_request_body_without_system() {
        let http = Client::new();
        let body = client(&http).build_request_body(None, "hi");
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":" Smith, J. "},{"type":"tool_use","id":"x"},{"type":"text","text":"(2020)."}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("Smith, J. (2020)."));
    }

    #[test]
    fn test_extract_text_empty() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(extract_text(response), None);
    }
}
