//! 流程状态
//!
//! 每个阶段接收当前状态的只读引用，返回一个局部更新；由流程驱动合并。
//! 后写入的字段覆盖先前的同名字段，`errors` 只追加不覆盖。

use std::collections::HashMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::models::{AgentsHealth, EvaluationResult, McqCandidate};

/// 当前所处阶段（最后完成的阶段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Start,
    TopicsExtracted,
    HealthChecked,
    McqsGenerated,
    QuizCreated,
    ExamEvaluated,
    Failed,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::TopicsExtracted => "topics_extracted",
            Step::HealthChecked => "health_checked",
            Step::McqsGenerated => "mcqs_generated",
            Step::QuizCreated => "quiz_created",
            Step::ExamEvaluated => "exam_evaluated",
            Step::Failed => "failed",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 贯穿整个流程的状态，每次调用新建，不在并发调用间共享
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub syllabus_content: String,
    pub syllabus_id: i64,
    pub topics: Vec<String>,
    pub mcqs: Vec<McqCandidate>,
    pub quiz_questions: Vec<McqCandidate>,
    /// 题目编号（字符串）→ 提交的选项
    pub user_answers: HashMap<String, String>,
    pub exam_results: Option<EvaluationResult>,
    pub current_step: Step,
    pub agent_health: Option<AgentsHealth>,
    pub errors: Vec<String>,
}

impl WorkflowState {
    /// 只填入输入字段的初始状态
    pub fn new(syllabus_content: impl Into<String>, syllabus_id: i64) -> Self {
        Self {
            syllabus_content: syllabus_content.into(),
            syllabus_id,
            topics: Vec::new(),
            mcqs: Vec::new(),
            quiz_questions: Vec::new(),
            user_answers: HashMap::new(),
            exam_results: None,
            current_step: Step::Start,
            agent_health: None,
            errors: Vec::new(),
        }
    }

    pub fn with_answers(mut self, user_answers: HashMap<String, String>) -> Self {
        self.user_answers = user_answers;
        self
    }

    /// 顶层意外失败时的终态
    pub fn failed(syllabus_content: String, syllabus_id: i64, error: String) -> Self {
        let mut state = Self::new(syllabus_content, syllabus_id);
        state.current_step = Step::Failed;
        state.errors.push(error);
        state
    }

    /// 合并一个阶段的局部更新
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(topics) = update.topics {
            self.topics = topics;
        }
        if let Some(mcqs) = update.mcqs {
            self.mcqs = mcqs;
        }
        if let Some(quiz_questions) = update.quiz_questions {
            self.quiz_questions = quiz_questions;
        }
        if let Some(exam_results) = update.exam_results {
            self.exam_results = Some(exam_results);
        }
        if let Some(agent_health) = update.agent_health {
            self.agent_health = Some(agent_health);
        }
        self.current_step = update.current_step;
        self.errors.extend(update.errors);
    }
}

/// 阶段产出的局部更新
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub current_step: Step,
    pub topics: Option<Vec<String>>,
    pub mcqs: Option<Vec<McqCandidate>>,
    pub quiz_questions: Option<Vec<McqCandidate>>,
    pub exam_results: Option<EvaluationResult>,
    pub agent_health: Option<AgentsHealth>,
    /// 本阶段新增的错误
    pub errors: Vec<String>,
}

impl StateUpdate {
    pub fn new(current_step: Step) -> Self {
        Self {
            current_step,
            topics: None,
            mcqs: None,
            quiz_questions: None,
            exam_results: None,
            agent_health: None,
            errors: Vec::new(),
        }
    }

    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.topics = Some(topics);
        self
    }

    pub fn mcqs(mut self, mcqs: Vec<McqCandidate>) -> Self {
        self.mcqs = Some(mcqs);
        self
    }

    pub fn quiz_questions(mut self, quiz_questions: Vec<McqCandidate>) -> Self {
        self.quiz_questions = Some(quiz_questions);
        self
    }

    pub fn exam_results(mut self, exam_results: EvaluationResult) -> Self {
        self.exam_results = Some(exam_results);
        self
    }

    pub fn agent_health(mut self, agent_health: AgentsHealth) -> Self {
        self.agent_health = Some(agent_health);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerOption;
    use crate::test_support::sample_mcq;

    #[test]
    fn test_apply_overwrites_fields_and_appends_errors() {
        let mut state = WorkflowState::new("content", 1);
        state.apply(
            StateUpdate::new(Step::TopicsExtracted)
                .topics(vec!["A".into()])
                .error("first"),
        );
        state.apply(
            StateUpdate::new(Step::McqsGenerated)
                .mcqs(vec![sample_mcq("A", "q", AnswerOption::A)])
                .error("second"),
        );

        assert_eq!(state.current_step, Step::McqsGenerated);
        assert_eq!(state.topics, vec!["A"]);
        assert_eq!(state.mcqs.len(), 1);
        assert_eq!(state.errors, vec!["first", "second"]);
    }

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut state = WorkflowState::new("content", 1);
        state.apply(StateUpdate::new(Step::TopicsExtracted).topics(vec!["A".into()]));
        state.apply(StateUpdate::new(Step::HealthChecked));
        assert_eq!(state.topics, vec!["A"]);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_step_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Step::QuizCreated).unwrap(), "\"quiz_created\"");
        assert_eq!(Step::ExamEvaluated.to_string(), "exam_evaluated");
    }
}
