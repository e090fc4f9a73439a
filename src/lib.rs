//! # Biblio Fixer
//!
//! 使用 LLM 把书目条目转换为目标引用格式的工具
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有共享资源，只暴露能力
//! - `EntryStore` - 唯一的条目 owner，提供按 id 的原子部分更新
//!
//! ### ② 业务能力层（Services / Clients）
//! - `clients/` - LLM 提供商调用（OpenAI 兼容接口、Anthropic）
//! - `services/` - 描述"我能做什么"，只处理单条书目
//! - `Generator` - 把书目改写为目标格式
//! - `Validator` - 从格式规范、信息完整两个维度打分
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条书目"的完整处理流程
//! - `EntryFlow` - 生成 → 校验 → 带反馈重试（最多三轮）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 分批并发处理，批间串行
//! - `orchestrator/app` - 设置快照、导入导出
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::EntryStore;
pub use models::{Entry, EntryPatch, EntryStatus, Example, Settings, ValidationResult};
pub use orchestrator::{App, BatchProcessor, BatchStats};
pub use services::{GenerateRequest, Generator, ValidateRequest, ValidationMode, Validator};
pub use workflow::{EntryFlow, ProcessOutcome};
