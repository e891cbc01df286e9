//! 题库存储 - 基础设施层
//!
//! 只暴露"存 / 取"的能力，不认识流程。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::{EvaluationResult, Grade, McqCandidate, QuizQuestion};

/// 已上传的大纲
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Syllabus {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub topics: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// 一次答题记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub syllabus_id: i64,
    pub question_ids: Vec<i64>,
    pub answers: HashMap<String, String>,
    pub score_percentage: f64,
    pub total_questions: usize,
    pub grade: Grade,
    pub attempted_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn from_result(
        syllabus_id: i64,
        questions: &[QuizQuestion],
        answers: HashMap<String, String>,
        result: &EvaluationResult,
    ) -> Self {
        Self {
            syllabus_id,
            question_ids: questions.iter().map(|q| q.id).collect(),
            answers,
            score_percentage: result.score_percentage,
            total_questions: result.total_questions,
            grade: result.grade,
            attempted_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn save_syllabus(
        &self,
        title: &str,
        content: &str,
        topics: &[String],
    ) -> Result<Syllabus, StoreError>;

    async fn load_syllabus(&self, id: i64) -> Result<Syllabus, StoreError>;

    /// 写入题目，返回实际新增的数量；不完整或重复的题目会被跳过
    async fn insert_mcqs(&self, syllabus_id: i64, mcqs: &[McqCandidate]) -> Result<usize, StoreError>;

    /// 按写入顺序取前 `limit` 道题，编号为题目的存储 id
    async fn quiz_questions(&self, syllabus_id: i64, limit: usize) -> Result<Vec<QuizQuestion>, StoreError>;

    async fn insert_quiz_attempt(&self, attempt: QuizAttempt) -> Result<i64, StoreError>;

    async fn quiz_attempts(&self, syllabus_id: i64) -> Result<Vec<QuizAttempt>, StoreError>;
}

#[derive(Default)]
struct Tables {
    syllabi: Vec<Syllabus>,
    /// (题目 id, 大纲 id, 题目)
    mcqs: Vec<(i64, i64, McqCandidate)>,
    attempts: Vec<QuizAttempt>,
}

/// 进程内存储
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn save_syllabus(
        &self,
        title: &str,
        content: &str,
        topics: &[String],
    ) -> Result<Syllabus, StoreError> {
        let mut tables = self.tables.write().await;
        let syllabus = Syllabus {
            id: tables.syllabi.len() as i64 + 1,
            title: title.to_string(),
            content: content.to_string(),
            topics: topics.to_vec(),
            uploaded_at: Utc::now(),
        };
        tables.syllabi.push(syllabus.clone());
        debug!("保存大纲 {} ({})", syllabus.id, syllabus.title);
        Ok(syllabus)
    }

    async fn load_syllabus(&self, id: i64) -> Result<Syllabus, StoreError> {
        let tables = self.tables.read().await;
        tables
            .syllabi
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StoreError::SyllabusNotFound { id })
    }

    async fn insert_mcqs(&self, syllabus_id: i64, mcqs: &[McqCandidate]) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.syllabi.iter().any(|s| s.id == syllabus_id) {
            return Err(StoreError::SyllabusNotFound { id: syllabus_id });
        }

        let mut seen: HashSet<String> = tables
            .mcqs
            .iter()
            .filter(|(_, owner, _)| *owner == syllabus_id)
            .map(|(_, _, mcq)| mcq.question.clone())
            .collect();

        let mut inserted = 0;
        for mcq in mcqs {
            if !mcq.is_complete() {
                warn!("跳过不完整的题目: {:?}", mcq.question);
                continue;
            }
            if !seen.insert(mcq.question.clone()) {
                debug!("跳过重复题目: {}", mcq.question);
                continue;
            }
            let id = tables.mcqs.len() as i64 + 1;
            tables.mcqs.push((id, syllabus_id, mcq.clone()));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn quiz_questions(&self, syllabus_id: i64, limit: usize) -> Result<Vec<QuizQuestion>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .mcqs
            .iter()
            .filter(|(_, owner, _)| *owner == syllabus_id)
            .take(limit)
            .map(|(id, _, mcq)| QuizQuestion {
                id: *id,
                mcq: mcq.clone(),
            })
            .collect())
    }

    async fn insert_quiz_attempt(&self, attempt: QuizAttempt) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        tables.attempts.push(attempt);
        Ok(tables.attempts.len() as i64)
    }

    async fn quiz_attempts(&self, syllabus_id: i64) -> Result<Vec<QuizAttempt>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .attempts
            .iter()
            .filter(|a| a.syllabus_id == syllabus_id)
            .cloned()
            .collect())
    }
}
