//! 备考流程 - 流程层
//!
//! 流程顺序：
//! 1. 提取主题
//! 2. 生成器健康检查
//! 3. 逐主题委派生成
//! 4. 抽取测验
//! 5. 评分（仅在带答案时）
//!
//! 任何阶段的失败（包括 panic）都只记录到 `errors`，不会中断流程。

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{EvaluationResult, QuizQuestion};
use crate::services::llm_service::ChatModel;
use crate::services::supervisor::Supervisor;
use crate::services::syllabus::TopicExtractor;
use crate::workflow::stages::{self, Stage};
use crate::workflow::state::{StateUpdate, WorkflowState};

/// 流程参数
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub mcqs_per_topic: usize,
    pub quiz_size: usize,
    pub max_concurrent_topics: usize,
    /// 固定种子让测验抽样可复现
    pub quiz_seed: Option<u64>,
}

impl From<&Config> for WorkflowSettings {
    fn from(config: &Config) -> Self {
        Self {
            mcqs_per_topic: config.mcqs_per_topic,
            quiz_size: config.quiz_size,
            max_concurrent_topics: config.max_concurrent_topics,
            quiz_seed: None,
        }
    }
}

/// 备考流程
///
/// - 持有 Supervisor 和主题提取器
/// - 每次运行都从一个新的 `WorkflowState` 开始
pub struct ExamWorkflow {
    supervisor: Arc<Supervisor>,
    topic_extractor: TopicExtractor,
    settings: WorkflowSettings,
}

impl ExamWorkflow {
    pub fn new(config: &Config, model: Arc<dyn ChatModel>) -> Self {
        let timeout = Duration::from_secs(config.llm_timeout_secs);
        Self::from_parts(
            Arc::new(Supervisor::new(config, model.clone())),
            TopicExtractor::new(model, timeout),
            WorkflowSettings::from(config),
        )
    }

    pub fn from_parts(
        supervisor: Arc<Supervisor>,
        topic_extractor: TopicExtractor,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            supervisor,
            topic_extractor,
            settings,
        }
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// 从大纲到测验的完整流程
    pub async fn run_exam_preparation(
        &self,
        syllabus_content: &str,
        syllabus_id: i64,
    ) -> WorkflowState {
        self.run(WorkflowState::new(syllabus_content, syllabus_id)).await
    }

    /// 从给定初始状态开始运行；带答案的状态会继续评分
    pub async fn run(&self, initial: WorkflowState) -> WorkflowState {
        let syllabus_content = initial.syllabus_content.clone();
        let syllabus_id = initial.syllabus_id;
        guard_run(syllabus_content, syllabus_id, self.drive(initial)).await
    }

    /// 对已有测验直接评分，不经过生成阶段
    pub fn run_exam_evaluation(
        &self,
        quiz_questions: &[QuizQuestion],
        user_answers: &HashMap<String, String>,
    ) -> EvaluationResult {
        if quiz_questions.is_empty() {
            return EvaluationResult::empty(
                "No questions available for evaluation",
                "No quiz questions provided",
            );
        }

        let evaluated = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.supervisor.evaluate(quiz_questions, user_answers)
        }));
        evaluated.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!("评分失败: {}", message);
            EvaluationResult::empty(format!("Evaluation failed: {}", message), message)
        })
    }

    async fn drive(&self, mut state: WorkflowState) -> WorkflowState {
        let mut rng = self.quiz_rng();
        let mut stage = Some(Stage::ExtractTopics);

        while let Some(current) = stage {
            let outcome = AssertUnwindSafe(self.run_stage(current, &state, &mut rng))
                .catch_unwind()
                .await;
            let update = outcome.unwrap_or_else(|panic| {
                let message = format!("{} failed: {}", current.label(), panic_message(panic.as_ref()));
                warn!("[大纲 {}] {}", state.syllabus_id, message);
                current.fallback(message)
            });
            state.apply(update);
            stage = current.next(&state);
        }

        state
    }

    async fn run_stage(&self, stage: Stage, state: &WorkflowState, rng: &mut StdRng) -> StateUpdate {
        match stage {
            Stage::ExtractTopics => stages::extract_topics(&self.topic_extractor, state).await,
            Stage::CheckHealth => stages::check_health(&self.supervisor).await,
            Stage::GenerateMcqs => {
                stages::generate_mcqs(
                    self.supervisor.clone(),
                    state,
                    self.settings.mcqs_per_topic,
                    self.settings.max_concurrent_topics,
                )
                .await
            }
            Stage::CreateQuiz => stages::create_quiz(state, self.settings.quiz_size, rng),
            Stage::EvaluateExam => stages::evaluate_exam(&self.supervisor, state),
        }
    }

    fn quiz_rng(&self) -> StdRng {
        match self.settings.quiz_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// 阶段之外的 panic 统一转为 `Step::Failed` 终态
async fn guard_run(
    syllabus_content: String,
    syllabus_id: i64,
    run: impl Future<Output = WorkflowState>,
) -> WorkflowState {
    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(state) => {
            info!(
                "[大纲 {}] 流程结束于 {}，错误 {} 条",
                syllabus_id,
                state.current_step,
                state.errors.len()
            );
            state
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("[大纲 {}] 流程执行失败: {}", syllabus_id, message);
            WorkflowState::failed(
                syllabus_content,
                syllabus_id,
                format!("Workflow execution failed: {}", message),
            )
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerOption;
    use crate::services::llm_service::ChatRequest;
    use crate::services::syllabus::SENTINEL_TOPIC;
    use crate::test_support::{answers_from_pairs, mcq_array_json, sample_mcq, ScriptedModel};
    use crate::workflow::state::Step;

    /// 按提示词内容路由的模型
    fn routed_model(topics: &'static str) -> Arc<dyn ChatModel> {
        Arc::new(ScriptedModel::new(move |request: &ChatRequest| {
            let prompt = request.user.as_str();
            if prompt.contains("Extract 5-10 key topics") {
                Ok(topics.to_string())
            } else if prompt.starts_with("Classify") {
                Ok("general".to_string())
            } else if prompt.contains("multiple choice questions") {
                Ok(mcq_array_json(3))
            } else {
                Ok("ok".to_string())
            }
        }))
    }

    fn settings() -> WorkflowSettings {
        WorkflowSettings {
            mcqs_per_topic: 3,
            quiz_size: 10,
            max_concurrent_topics: 2,
            quiz_seed: Some(42),
        }
    }

    fn workflow(model: Arc<dyn ChatModel>) -> ExamWorkflow {
        let config = Config::default();
        ExamWorkflow::from_parts(
            Arc::new(Supervisor::new(&config, model.clone())),
            TopicExtractor::new(model, Duration::from_secs(1)),
            settings(),
        )
    }

    #[tokio::test]
    async fn test_preparation_reaches_quiz_created() {
        let flow = workflow(routed_model(r#"["History", "Biology", "Poetry", "Art", "Music"]"#));
        let state = flow.run_exam_preparation("syllabus", 1).await;

        assert_eq!(state.current_step, Step::QuizCreated);
        assert_eq!(state.topics.len(), 5);
        assert_eq!(state.mcqs.len(), 15);
        assert_eq!(state.quiz_questions.len(), 10);
        assert!(state.exam_results.is_none());
        assert!(state.errors.is_empty());
        assert_eq!(state.agent_health.unwrap().total_agents, 2);
    }

    #[tokio::test]
    async fn test_backend_down_still_completes() {
        let flow = workflow(Arc::new(ScriptedModel::failing()));
        let state = flow.run_exam_preparation("syllabus", 2).await;

        assert_eq!(state.current_step, Step::QuizCreated);
        assert_eq!(state.topics, vec![SENTINEL_TOPIC]);
        assert!(state.mcqs.is_empty());
        assert!(state.quiz_questions.is_empty());
        assert!(state.errors.iter().any(|e| e.starts_with("Topic extraction failed")));
    }

    #[tokio::test]
    async fn test_answers_lead_to_evaluation() {
        let flow = workflow(routed_model(r#"["History"]"#));
        let answers = answers_from_pairs([("0", "B"), ("1", "b"), ("2", "A")]);
        let state = flow
            .run(WorkflowState::new("syllabus", 3).with_answers(answers))
            .await;

        assert_eq!(state.current_step, Step::ExamEvaluated);
        let results = state.exam_results.unwrap();
        assert_eq!(results.total_questions, 3);
        assert_eq!(results.correct_answers, 2);
    }

    #[tokio::test]
    async fn test_panicking_stages_fall_back_and_continue() {
        let model: Arc<dyn ChatModel> = Arc::new(ScriptedModel::new(|request: &ChatRequest| {
            let prompt = request.user.as_str();
            if prompt.contains("Extract 5-10 key topics") {
                panic!("extractor exploded");
            } else if prompt.starts_with("Classify") {
                Ok("general".to_string())
            } else if prompt.contains("multiple choice questions for: General Topics") {
                panic!("generator exploded");
            } else {
                Ok("ok".to_string())
            }
        }));
        let state = workflow(model).run_exam_preparation("syllabus", 5).await;

        assert_eq!(state.current_step, Step::QuizCreated);
        assert_eq!(state.topics, vec![SENTINEL_TOPIC]);
        assert!(state.mcqs.is_empty());
        assert_eq!(state.errors.len(), 2);
        assert_eq!(state.errors[0], "Topic extraction failed: extractor exploded");
        assert!(state.errors[1].starts_with("MCQ generation failed for topic 'General Topics':"));
    }

    #[tokio::test]
    async fn test_panic_outside_stages_marks_run_failed() {
        async fn exploding_driver() -> WorkflowState {
            panic!("driver exploded")
        }

        let state = guard_run("content".to_string(), 6, exploding_driver()).await;

        assert_eq!(state.current_step, Step::Failed);
        assert_eq!(state.syllabus_id, 6);
        assert_eq!(state.syllabus_content, "content");
        assert!(state.topics.is_empty());
        assert_eq!(state.errors, vec!["Workflow execution failed: driver exploded"]);
    }

    #[test]
    fn test_evaluation_of_empty_quiz() {
        let flow = workflow(Arc::new(ScriptedModel::failing()));
        let result = flow.run_exam_evaluation(&[], &HashMap::new());
        assert_eq!(result.total_questions, 0);
        assert_eq!(result.feedback, "No questions available for evaluation");
        assert_eq!(result.error.as_deref(), Some("No quiz questions provided"));
    }

    #[test]
    fn test_direct_evaluation() {
        let flow = workflow(Arc::new(ScriptedModel::failing()));
        let quiz = vec![QuizQuestion {
            id: 7,
            mcq: sample_mcq("T", "Q", AnswerOption::C),
        }];
        let result = flow.run_exam_evaluation(&quiz, &answers_from_pairs([("7", "c")]));
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.score_percentage, 100.0);
    }

    #[test]
    fn test_panic_message_extraction() {
        let panic = std::panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "boom 1");
        let panic = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "static");
    }
}
