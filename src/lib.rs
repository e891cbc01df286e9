//! # Exam Prep Agent
//!
//! 从课程大纲自动生成选择题、组卷并评分
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 存储和文本提取，只暴露能力
//! - `ExamStore` / `MemoryStore` - 大纲、题目、答题记录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LlmService` - 后端模型调用（`ChatModel`）
//! - `TopicClassifier` / `TopicExtractor` - 主题分类与提取
//! - `MathGenerator` / `GeneralGenerator` - 按类别生成题目
//! - `Supervisor` - 健康检查、委派与评分
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份大纲"的完整处理流程
//! - `WorkflowState` - 流程状态，阶段之间只通过它传递
//! - `ExamWorkflow` - 流程编排（主题 → 健康检查 → 生成 → 测验 → 评分）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/exam_service` - 对外的备考操作
//! - `orchestrator/batch_processor` - 批量处理大纲目录

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ExamStore, MemoryStore};
pub use models::{Category, EvaluationResult, McqCandidate, QuizQuestion};
pub use orchestrator::{App, ExamService};
pub use services::{ChatModel, ChatRequest, LlmService, Supervisor};
pub use workflow::{ExamWorkflow, Step, WorkflowState};
