//! 备考服务 - 编排层
//!
//! 把存储、文本提取和备考流程串成对外的五个操作：
//! 上传大纲、生成题目、取测验、交卷、查看生成器状态。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, StoreError};
use crate::infrastructure::{extract_text, DocumentKind, ExamStore, QuizAttempt};
use crate::models::{AgentsHealth, EvaluationResult, PublicQuizQuestion};
use crate::services::llm_service::ChatModel;
use crate::services::syllabus::{TopicExtractor, SENTINEL_TOPIC};
use crate::workflow::{ExamWorkflow, WorkflowState};

/// 上传结果
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub syllabus_id: i64,
    pub title: String,
    pub topics: Vec<String>,
    pub content_length: usize,
}

/// 生成结果
#[derive(Debug, Clone, Serialize)]
pub struct PreparationReport {
    pub syllabus_id: i64,
    /// 实际写入存储的题目数
    pub mcqs_saved: usize,
    pub state: WorkflowState,
}

impl PreparationReport {
    pub fn quiz_size(&self) -> usize {
        self.state.quiz_questions.len()
    }
}

/// 交卷结果
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub attempt_id: i64,
    pub results: EvaluationResult,
}

pub struct ExamService {
    store: Arc<dyn ExamStore>,
    workflow: ExamWorkflow,
    topic_extractor: TopicExtractor,
    quiz_size: usize,
}

impl ExamService {
    pub fn new(config: &Config, model: Arc<dyn ChatModel>, store: Arc<dyn ExamStore>) -> Self {
        let timeout = Duration::from_secs(config.llm_timeout_secs);
        Self {
            store,
            workflow: ExamWorkflow::new(config, model.clone()),
            topic_extractor: TopicExtractor::new(model, timeout),
            quiz_size: config.quiz_size,
        }
    }

    /// 上传大纲：提取文本 → 提取主题 → 保存
    pub async fn upload_syllabus(&self, filename: &str, bytes: &[u8]) -> AppResult<UploadReport> {
        info!("📄 上传大纲: {}", filename);
        let kind = DocumentKind::from_filename(filename)?;
        let content = extract_text(bytes, kind);
        info!("从 {} 中提取了 {} 个字符", filename, content.chars().count());

        let topics = match self.topic_extractor.extract_topics(&content).await {
            Ok(topics) => topics,
            Err(e) => {
                warn!("上传时主题提取失败，使用哨兵主题: {}", e);
                vec![SENTINEL_TOPIC.to_string()]
            }
        };

        let syllabus = self.store.save_syllabus(filename, &content, &topics).await?;
        info!("大纲已保存，ID: {}", syllabus.id);

        Ok(UploadReport {
            syllabus_id: syllabus.id,
            title: syllabus.title,
            topics: syllabus.topics,
            content_length: content.chars().count(),
        })
    }

    /// 对已保存的大纲运行备考流程，并把生成的题目写入存储
    pub async fn prepare_exam(&self, syllabus_id: i64) -> AppResult<PreparationReport> {
        let syllabus = self.store.load_syllabus(syllabus_id).await?;
        info!("[大纲 {}] 开始备考流程: {}", syllabus_id, syllabus.title);

        let state = self
            .workflow
            .run_exam_preparation(&syllabus.content, syllabus_id)
            .await;

        let mcqs_saved = if state.mcqs.is_empty() {
            warn!("[大纲 {}] 流程没有生成任何题目", syllabus_id);
            0
        } else {
            self.store.insert_mcqs(syllabus_id, &state.mcqs).await?
        };
        info!("[大纲 {}] 已保存 {} 道题", syllabus_id, mcqs_saved);

        Ok(PreparationReport {
            syllabus_id,
            mcqs_saved,
            state,
        })
    }

    /// 取测验题（不含答案）
    pub async fn quiz(&self, syllabus_id: i64) -> AppResult<Vec<PublicQuizQuestion>> {
        self.store.load_syllabus(syllabus_id).await?;
        let questions = self.store.quiz_questions(syllabus_id, self.quiz_size).await?;
        if questions.is_empty() {
            return Err(StoreError::NoQuestions { syllabus_id }.into());
        }
        Ok(questions.iter().map(|q| q.redacted()).collect())
    }

    /// 交卷：对同一批测验题评分并记录
    pub async fn submit_exam(
        &self,
        syllabus_id: i64,
        answers: HashMap<String, String>,
    ) -> AppResult<SubmissionReport> {
        let questions = self.store.quiz_questions(syllabus_id, self.quiz_size).await?;
        if questions.is_empty() {
            return Err(StoreError::NoQuestions { syllabus_id }.into());
        }
        info!(
            "[大纲 {}] 交卷: {} 题，作答 {} 题",
            syllabus_id,
            questions.len(),
            answers.len()
        );

        let results = self.workflow.run_exam_evaluation(&questions, &answers);
        info!(
            "[大纲 {}] 得分 {}% ({})",
            syllabus_id, results.score_percentage, results.grade
        );

        let attempt = QuizAttempt::from_result(syllabus_id, &questions, answers, &results);
        let attempt_id = self.store.insert_quiz_attempt(attempt).await?;

        Ok(SubmissionReport { attempt_id, results })
    }

    pub async fn agent_health(&self) -> AgentsHealth {
        self.workflow.supervisor().check_agents_health().await
    }
}
