//! 书目条目数据模型

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 条目处理状态
///
/// `Idle → Generating → Validating → Done`，任何一步出错则进入 `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Idle,
    Generating,
    Validating,
    Done,
    Error,
}

impl EntryStatus {
    /// 状态显示名称
    pub fn label(self) -> &'static str {
        match self {
            EntryStatus::Idle => "等待",
            EntryStatus::Generating => "生成中",
            EntryStatus::Validating => "校验中",
            EntryStatus::Done => "完成",
            EntryStatus::Error => "错误",
        }
    }
}

impl Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 单个校验器的判断结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 0-10 分
    pub score: u8,
    pub comment: String,
}

impl ValidationResult {
    pub fn new(is_valid: bool, score: u8, comment: impl Into<String>) -> Self {
        Self {
            is_valid,
            score: score.min(10),
            comment: comment.into(),
        }
    }
}

/// 书目条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    /// 原始文本
    pub original: String,
    /// 转换后的文本
    pub converted: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_style: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator_integrity: Option<ValidationResult>,
    /// 附加说明（重试进度、错误信息、重试上限提示）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_comment: Option<String>,
}

impl Entry {
    /// 从一行原始文本创建新条目
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original: original.into(),
            converted: String::new(),
            status: EntryStatus::Idle,
            validator_style: None,
            validator_integrity: None,
            validation_comment: None,
        }
    }

    /// 两个校验器是否都已通过
    pub fn is_fully_valid(&self) -> bool {
        matches!(
            (&self.validator_style, &self.validator_integrity),
            (Some(style), Some(integrity)) if style.is_valid && integrity.is_valid
        )
    }
}

/// 条目的部分字段更新
///
/// 只有 `Some` 的字段会被写入；`validation_comment` 使用双层 Option，
/// `Some(None)` 表示清除说明
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub status: Option<EntryStatus>,
    pub converted: Option<String>,
    pub validator_style: Option<ValidationResult>,
    pub validator_integrity: Option<ValidationResult>,
    pub validation_comment: Option<Option<String>>,
}

impl EntryPatch {
    pub fn status(status: EntryStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_converted(mut self, converted: impl Into<String>) -> Self {
        self.converted = Some(converted.into());
        self
    }

    pub fn with_validation(mut self, style: ValidationResult, integrity: ValidationResult) -> Self {
        self.validator_style = Some(style);
        self.validator_integrity = Some(integrity);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.validation_comment = Some(Some(comment.into()));
        self
    }

    pub fn clear_comment(mut self) -> Self {
        self.validation_comment = Some(None);
        self
    }

    /// 把更新合并到条目上
    pub fn apply(self, entry: &mut Entry) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(converted) = self.converted {
            entry.converted = converted;
        }
        if let Some(style) = self.validator_style {
            entry.validator_style = Some(style);
        }
        if let Some(integrity) = self.validator_integrity {
            entry.validator_integrity = Some(integrity);
        }
        if let Some(comment) = self.validation_comment {
            entry.validation_comment = comment;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_touches_set_fields() {
        let mut entry = Entry::new("Smith, J. (2020). Title. Journal.");
        entry.validation_comment = Some("修正中 2/3...".to_string());

        EntryPatch::status(EntryStatus::Validating)
            .with_converted("Smith, J. (2020). Title. *Journal*.")
            .apply(&mut entry);

        assert_eq!(entry.status, EntryStatus::Validating);
        assert_eq!(entry.converted, "Smith, J. (2020). Title. *Journal*.");
        assert_eq!(entry.validation_comment.as_deref(), Some("修正中 2/3..."));
        assert!(entry.validator_style.is_none());
    }

    #[test]
    fn test_patch_clears_comment() {
        let mut entry = Entry::new("x");
        entry.validation_comment = Some("old".to_string());

        EntryPatch::status(EntryStatus::Done).clear_comment().apply(&mut entry);

        assert_eq!(entry.validation_comment, None);
    }

    #[test]
    fn test_fully_valid_requires_both() {
        let mut entry = Entry::new("x");
        assert!(!entry.is_fully_valid());

        entry.validator_style = Some(ValidationResult::new(true, 9, "ok"));
        entry.validator_integrity = Some(ValidationResult::new(false, 4, "year missing"));
        assert!(!entry.is_fully_valid());

        entry.validator_integrity = Some(ValidationResult::new(true, 10, "ok"));
        assert!(entry.is_fully_valid());
    }

    #[test]
    fn test_score_is_capped() {
        assert_eq!(ValidationResult::new(true, 42, "").score, 10);
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let mut entry = Entry::new("x");
        entry.validator_style = Some(ValidationResult::new(true, 9, "ok"));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["status"], "idle");
        assert_eq!(json["validatorStyle"]["isValid"], true);
        assert!(json.get("validatorIntegrity").is_none());
    }
}
