//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量大纲处理器
//! - 管理应用生命周期
//! - 扫描大纲目录，控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `exam_service` - 备考服务
//! - 上传大纲、生成题目、取测验、交卷、查看生成器状态
//! - 持有存储，调用流程层
//!
//! ### `report_writer` - 报告写入
//! - 每份大纲一行 JSON
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<大纲文件>)
//!     ↓
//! exam_service (处理单份大纲)
//!     ↓
//! workflow::ExamWorkflow (主题 → 健康检查 → 生成 → 测验 → 评分)
//!     ↓
//! services (能力层：分类 / 生成 / 评分 / LLM)
//!     ↓
//! infrastructure (存储、文本提取)
//! ```

pub mod batch_processor;
pub mod exam_service;
pub mod report_writer;

pub use batch_processor::App;
pub use exam_service::{ExamService, PreparationReport, SubmissionReport, UploadReport};
pub use report_writer::{ReportWriter, SyllabusReport};
