use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// 等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "F")]
    F,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// 分数 → 等级，区间左闭右开
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Grade::APlus
        } else if percentage >= 80.0 {
            Grade::A
        } else if percentage >= 70.0 {
            Grade::B
        } else if percentage >= 60.0 {
            Grade::C
        } else if percentage >= 50.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单题评分明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub question: String,
    /// 原样保留用户提交的答案
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: String,
    pub topic: String,
}

/// 测验评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub total_questions: usize,
    pub correct_answers: usize,
    /// 0–100，保留两位小数
    pub score_percentage: f64,
    pub grade: Grade,
    pub detailed_results: Vec<QuestionResult>,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    /// 零分结果（附带原因），用于无题可评或评分失败
    pub fn empty(feedback: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            total_questions: 0,
            correct_answers: 0,
            score_percentage: 0.0,
            grade: Grade::F,
            detailed_results: Vec::new(),
            feedback: feedback.into(),
            error: Some(error.into()),
        }
    }
}
