//! 报告写入 - 编排层
//!
//! 把一份大纲的处理结果追加到报告文件，每行一个 JSON 对象

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{AgentsHealth, PublicQuizQuestion};
use crate::workflow::stages::number_questions;
use crate::workflow::state::{Step, WorkflowState};

/// 单份大纲的处理报告
#[derive(Debug, Clone, Serialize)]
pub struct SyllabusReport {
    pub source: String,
    pub syllabus_id: i64,
    pub current_step: Step,
    pub topics: Vec<String>,
    pub mcq_count: usize,
    /// 不含答案的测验
    pub quiz: Vec<PublicQuizQuestion>,
    pub agent_health: Option<AgentsHealth>,
    pub errors: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl SyllabusReport {
    pub fn from_state(source: impl Into<String>, state: &WorkflowState) -> Self {
        Self {
            source: source.into(),
            syllabus_id: state.syllabus_id,
            current_step: state.current_step,
            topics: state.topics.clone(),
            mcq_count: state.mcqs.len(),
            quiz: number_questions(&state.quiz_questions)
                .iter()
                .map(|q| q.redacted())
                .collect(),
            agent_health: state.agent_health.clone(),
            errors: state.errors.clone(),
            generated_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.current_step != Step::Failed && !self.quiz.is_empty()
    }
}

/// 报告写入服务
///
/// 多个任务并发写入时按行串行
pub struct ReportWriter {
    report_file_path: String,
    lock: Mutex<()>,
}

impl ReportWriter {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &str {
        &self.report_file_path
    }

    /// 追加一行报告
    ///
    /// # 参数
    /// - `report`: 单份大纲的处理报告
    ///
    /// # 返回
    /// 序列化或文件写入失败时返回错误
    pub async fn write(&self, report: &SyllabusReport) -> Result<()> {
        debug!(
            "写入报告: 大纲 {} | 步骤 {} | 测验 {} 题",
            report.source,
            report.current_step,
            report.quiz.len()
        );

        let line = serde_json::to_string(report)? + "\n";

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_file_path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }
}
