use serde::{Deserialize, Serialize};

/// Few-shot 示例：一条原文和它的期望格式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub id: String,
    pub original: String,
    pub expected: String,
}

impl Example {
    pub fn new(original: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original: original.into(),
            expected: expected.into(),
        }
    }
}
