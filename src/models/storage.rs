//! 持久化状态：设置和 few-shot 示例
//!
//! 条目列表不持久化，只在一次运行中存在

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, EntryError};
use crate::models::example::Example;
use crate::models::settings::Settings;

/// 保存在存储文件中的全部内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedState {
    pub settings: Settings,
    pub examples: Vec<Example>,
}

impl SavedState {
    /// 添加示例，返回新示例的 id
    pub fn add_example(&mut self, original: &str, expected: &str) -> AppResult<String> {
        let (original, expected) = (original.trim(), expected.trim());
        if original.is_empty() || expected.is_empty() {
            return Err(EntryError::EmptyExample.into());
        }

        let example = Example::new(original, expected);
        let id = example.id.clone();
        self.examples.push(example);
        Ok(id)
    }

    /// 修改示例；`None` 的字段保持不变
    pub fn update_example(
        &mut self,
        id: &str,
        original: Option<&str>,
        expected: Option<&str>,
    ) -> AppResult<()> {
        let example = self
            .examples
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EntryError::ExampleNotFound { id: id.to_string() })?;

        if let Some(original) = original {
            example.original = original.trim().to_string();
        }
        if let Some(expected) = expected {
            example.expected = expected.trim().to_string();
        }
        Ok(())
    }

    /// 删除示例
    pub fn remove_example(&mut self, id: &str) -> AppResult<Example> {
        let index = self
            .examples
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EntryError::ExampleNotFound { id: id.to_string() })?;
        Ok(self.examples.remove(index))
    }
}
