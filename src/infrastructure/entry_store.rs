//! 条目仓库 - 基础设施层
//!
//! 唯一持有全部条目的地方，只暴露按 id 的原子部分更新能力。
//! 每次修改都会递增版本号并通过 `watch` 通道通知观察者。

use std::collections::HashSet;
use std::sync::Mutex;

use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::models::{Entry, EntryPatch, EntryStatus};

/// 条目仓库
pub struct EntryStore {
    entries: RwLock<Vec<Entry>>,
    /// 正在处理中的条目 id，同一条目同时只允许一个处理流程
    claimed: Mutex<HashSet<String>>,
    revision: watch::Sender<u64>,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            entries: RwLock::new(Vec::new()),
            claimed: Mutex::new(HashSet::new()),
            revision,
        }
    }

    /// 订阅修改通知，值为当前版本号
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// 导入条目：每个非空行一条，返回新条目的 id
    pub async fn add_entries<I, S>(&self, originals: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let new_entries: Vec<Entry> = originals
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .map(Entry::new)
            .collect();
        let ids = new_entries.iter().map(|e| e.id.clone()).collect();

        self.entries.write().await.extend(new_entries);
        self.bump();
        ids
    }

    /// 按 id 合并部分字段；条目不存在时返回 false
    pub async fn update(&self, id: &str, patch: EntryPatch) -> bool {
        let updated = {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
                patch.apply(entry);
                debug!("条目 {} 更新为 {}", id, entry.status);
                true
            } else {
                false
            }
        };

        if updated {
            self.bump();
        } else {
            debug!("更新被忽略，条目 {} 不存在", id);
        }
        updated
    }

    /// 手动修改转换结果
    pub async fn set_converted(&self, id: &str, converted: impl Into<String>) -> bool {
        self.update(id, EntryPatch::default().with_converted(converted))
            .await
    }

    pub async fn get(&self, id: &str) -> Option<Entry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// 当前全部条目的副本（按导入顺序）
    pub async fn snapshot(&self) -> Vec<Entry> {
        self.entries.read().await.clone()
    }

    /// 状态不是 `Done` 的条目 id（按导入顺序）
    pub async fn pending_ids(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.status != EntryStatus::Done)
            .map(|e| e.id.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 删除单个条目
    pub async fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|e| e.id != id);
            entries.len() != before
        };
        if removed {
            self.bump();
        }
        removed
    }

    /// 清空全部条目
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.bump();
    }

    /// 各状态的条目数量
    pub async fn status_counts(&self) -> StatusCounts {
        let entries = self.entries.read().await;
        let mut counts = StatusCounts::default();
        for entry in entries.iter() {
            match entry.status {
                EntryStatus::Idle => counts.idle += 1,
                EntryStatus::Generating => counts.generating += 1,
                EntryStatus::Validating => counts.validating += 1,
                EntryStatus::Done => counts.done += 1,
                EntryStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    /// 占用条目；已被占用时返回 None
    ///
    /// 返回的守卫在 drop 时释放占用
    pub fn try_claim(&self, id: &str) -> Option<EntryClaim<'_>> {
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        if claimed.insert(id.to_string()) {
            Some(EntryClaim {
                claimed: &self.claimed,
                id: id.to_string(),
            })
        } else {
            None
        }
    }
}

/// 条目占用守卫
pub struct EntryClaim<'a> {
    claimed: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for EntryClaim<'_> {
    fn drop(&mut self) {
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        claimed.remove(&self.id);
    }
}

/// 状态统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub idle: usize,
    pub generating: usize,
    pub validating: usize,
    pub done: usize,
    pub error: usize,
}

impl StatusCounts {
    /// 正在生成或校验的数量
    pub fn active(&self) -> usize {
        self.generating + self.validating
    }
}
