use crate::models::storage::SavedState;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 存储文件加载设置和示例
///
/// 文件不存在时返回默认状态
pub async fn load_saved_state(storage_path: &Path) -> Result<SavedState> {
    if !fs::try_exists(storage_path).await.unwrap_or(false) {
        tracing::info!(
            "存储文件 {} 不存在，使用默认设置",
            storage_path.display()
        );
        return Ok(SavedState::default());
    }

    let content = fs::read_to_string(storage_path)
        .await
        .with_context(|| format!("无法读取存储文件: {}", storage_path.display()))?;

    let state: SavedState = toml::from_str(&content)
        .with_context(|| format!("无法解析存储文件: {}", storage_path.display()))?;

    tracing::debug!(
        "已加载设置，示例数量: {}",
        state.examples.len()
    );

    Ok(state)
}

/// 把设置和示例写回 TOML 存储文件
pub async fn save_saved_state(storage_path: &Path, state: &SavedState) -> Result<()> {
    let content = toml::to_string_pretty(state).context("无法序列化设置")?;

    if let Some(parent) = storage_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }

    fs::write(storage_path, content)
        .await
        .with_context(|| format!("无法写入存储文件: {}", storage_path.display()))?;

    tracing::debug!("设置已保存至: {}", storage_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_saved_state(&dir.path().join("none.toml")).await.unwrap();
        assert_eq!(state, SavedState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("biblio-fixer-storage.toml");

        let mut state = SavedState::default();
        state.settings.target_style = "APA 7th".to_string();
        state.settings.concurrency_limit = 4;
        state.settings.api_keys.set(Provider::Mistral, "m-key").unwrap();
        state.settings.models.generator_provider = "custom".to_string();
        state.settings.models.generator_base_url = Some("http://localhost:1234/v1".to_string());
        state.add_example("a", "b").unwrap();

        save_saved_state(&path, &state).await.unwrap();
        let loaded = load_saved_state(&path).await.unwrap();

        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[settings]\ntarget_style = \"Chicago\"\n")
            .await
            .unwrap();

        let state = load_saved_state(&path).await.unwrap();
        assert_eq!(state.settings.target_style, "Chicago");
        assert_eq!(state.settings.concurrency_limit, 1);
        assert_eq!(state.settings.models.generator_model, "gpt-4o");
        assert!(state.examples.is_empty());
    }

    #[tokio::test]
    async fn test_broken_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "settings = [").await.unwrap();

        assert!(load_saved_state(&path).await.is_err());
    }
}
