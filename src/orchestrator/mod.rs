//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 选出待处理条目，按并发数分批
//! - 批内并发（tokio::spawn），批间串行
//! - 汇总统计，暴露 is_processing 标记
//!
//! ### `app` - 应用入口
//! - 加载设置快照，创建 LLM 客户端和条目仓库
//! - 导入书目、导出结果
//!
//! ## 层次关系
//!
//! ```text
//! app (文件 → 条目)
//!     ↓
//! batch_processor (处理 Vec<Entry>)
//!     ↓
//! workflow::EntryFlow (处理单个 Entry)
//!     ↓
//! services (能力层：generate / validate)
//!     ↓
//! clients (LLM 提供商)
//! ```

pub mod app;
pub mod batch_processor;

pub use app::App;
pub use batch_processor::{BatchProcessor, BatchStats};
