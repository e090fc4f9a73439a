//! 纯文本书目的导入与导出

use crate::models::entry::Entry;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 把粘贴的书目文本按行拆分，去掉首尾空白和空行
pub fn split_entry_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 从文本文件读取书目条目（每个非空行一条）
pub async fn load_entry_lines(input_path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(input_path)
        .await
        .with_context(|| format!("无法读取书目文件: {}", input_path.display()))?;

    let lines = split_entry_lines(&content);
    tracing::info!("从 {} 读取到 {} 条书目", input_path.display(), lines.len());
    Ok(lines)
}

/// 导出所有非空的转换结果，每行一条
pub fn export_converted(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(|e| e.converted.as_str())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 写出转换结果；没有任何结果时不创建文件，返回 false
pub async fn write_output(output_path: &Path, entries: &[Entry]) -> Result<bool> {
    let text = export_converted(entries);
    if text.is_empty() {
        tracing::warn!("⚠️ 没有可导出的转换结果");
        return Ok(false);
    }

    fs::write(output_path, text + "\n")
        .await
        .with_context(|| format!("无法写入输出文件: {}", output_path.display()))?;
    Ok(true)
}
