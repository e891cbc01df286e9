//! 流程阶段
//!
//! 每个阶段：读当前状态 → 产出局部更新。阶段内部的失败记录到 `errors`，
//! 并给自己的输出字段一个安全默认值，保证下游阶段总能继续。

use std::sync::Arc;

use rand::seq::index;
use rand::Rng;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::models::{AgentsHealth, EvaluationResult, McqCandidate, QuizQuestion};
use crate::services::supervisor::Supervisor;
use crate::services::syllabus::{TopicExtractor, SENTINEL_TOPIC};
use crate::workflow::state::{StateUpdate, Step, WorkflowState};

/// 流程节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractTopics,
    CheckHealth,
    GenerateMcqs,
    CreateQuiz,
    EvaluateExam,
}

impl Stage {
    /// 写入 `errors` 时使用的阶段名
    pub fn label(self) -> &'static str {
        match self {
            Stage::ExtractTopics => "Topic extraction",
            Stage::CheckHealth => "Health check",
            Stage::GenerateMcqs => "MCQ generation",
            Stage::CreateQuiz => "Quiz creation",
            Stage::EvaluateExam => "Exam evaluation",
        }
    }

    /// 阶段完成后的 `current_step`
    pub fn completes(self) -> Step {
        match self {
            Stage::ExtractTopics => Step::TopicsExtracted,
            Stage::CheckHealth => Step::HealthChecked,
            Stage::GenerateMcqs => Step::McqsGenerated,
            Stage::CreateQuiz => Step::QuizCreated,
            Stage::EvaluateExam => Step::ExamEvaluated,
        }
    }

    /// 固定拓扑，只有测验之后有一个分支：带答案才评分
    pub fn next(self, state: &WorkflowState) -> Option<Stage> {
        match self {
            Stage::ExtractTopics => Some(Stage::CheckHealth),
            Stage::CheckHealth => Some(Stage::GenerateMcqs),
            Stage::GenerateMcqs => Some(Stage::CreateQuiz),
            Stage::CreateQuiz => (!state.user_answers.is_empty()).then_some(Stage::EvaluateExam),
            Stage::EvaluateExam => None,
        }
    }

    /// 阶段失败时的安全输出
    pub fn fallback(self, error: String) -> StateUpdate {
        let update = StateUpdate::new(self.completes());
        let update = match self {
            Stage::ExtractTopics => update.topics(vec![SENTINEL_TOPIC.to_string()]),
            Stage::CheckHealth => update.agent_health(AgentsHealth::default()),
            Stage::GenerateMcqs => update.mcqs(Vec::new()),
            Stage::CreateQuiz => update.quiz_questions(Vec::new()),
            Stage::EvaluateExam => update.exam_results(EvaluationResult::empty(
                format!("Evaluation failed: {}", error),
                error.clone(),
            )),
        };
        update.error(error)
    }
}

/// 提取主题；失败或为空时使用哨兵主题
pub async fn extract_topics(extractor: &TopicExtractor, state: &WorkflowState) -> StateUpdate {
    info!("正在从大纲中提取主题...");
    match extractor.extract_topics(&state.syllabus_content).await {
        Ok(topics) if topics.is_empty() => {
            StateUpdate::new(Step::TopicsExtracted).topics(vec![SENTINEL_TOPIC.to_string()])
        }
        Ok(topics) => StateUpdate::new(Step::TopicsExtracted).topics(topics),
        Err(e) => {
            warn!("主题提取失败，使用哨兵主题: {}", e);
            Stage::ExtractTopics.fallback(format!("{} failed: {}", Stage::ExtractTopics.label(), e))
        }
    }
}

/// 生成前检查所有生成器
pub async fn check_health(supervisor: &Supervisor) -> StateUpdate {
    info!("正在检查生成器健康状态...");
    let health = supervisor.check_agents_health().await;
    StateUpdate::new(Step::HealthChecked).agent_health(health)
}

/// 逐主题委派生成，并发受限，结果按主题原顺序汇总
pub async fn generate_mcqs(
    supervisor: Arc<Supervisor>,
    state: &WorkflowState,
    mcqs_per_topic: usize,
    max_concurrent: usize,
) -> StateUpdate {
    info!("正在为 {} 个主题委派生成题目...", state.topics.len());

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let content: Arc<str> = Arc::from(state.syllabus_content.as_str());

    let handles: Vec<_> = state
        .topics
        .iter()
        .map(|topic| {
            let supervisor = supervisor.clone();
            let semaphore = semaphore.clone();
            let content = content.clone();
            let task_topic = topic.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                supervisor.delegate(&task_topic, &content, mcqs_per_topic).await
            });
            (topic.clone(), handle)
        })
        .collect();

    let mut update = StateUpdate::new(Step::McqsGenerated);
    let mut pooled: Vec<McqCandidate> = Vec::new();

    for (topic, handle) in handles {
        match handle.await {
            Ok(result) if result.is_success() => pooled.extend(result.mcqs),
            Ok(result) => {
                let reason = result.error.unwrap_or_default();
                warn!("主题 '{}' 生成失败: {}", topic, reason);
                update = update.error(format!(
                    "{} failed for topic '{}': {}",
                    Stage::GenerateMcqs.label(),
                    topic,
                    reason
                ));
            }
            Err(e) => {
                warn!("主题 '{}' 任务执行失败: {}", topic, e);
                update = update.error(format!(
                    "{} failed for topic '{}': {}",
                    Stage::GenerateMcqs.label(),
                    topic,
                    e
                ));
            }
        }
    }

    info!("共生成 {} 道题", pooled.len());
    update.mcqs(pooled)
}

/// 从题池中抽取测验题
pub fn create_quiz<R: Rng + ?Sized>(
    state: &WorkflowState,
    quiz_size: usize,
    rng: &mut R,
) -> StateUpdate {
    let quiz = select_quiz_questions(&state.mcqs, quiz_size, rng);
    info!("测验题目: {} / 题池 {}", quiz.len(), state.mcqs.len());
    StateUpdate::new(Step::QuizCreated).quiz_questions(quiz)
}

/// 超过上限时无放回均匀抽样，否则原样保留
pub fn select_quiz_questions<R: Rng + ?Sized>(
    mcqs: &[McqCandidate],
    quiz_size: usize,
    rng: &mut R,
) -> Vec<McqCandidate> {
    if mcqs.len() <= quiz_size {
        return mcqs.to_vec();
    }
    index::sample(rng, mcqs.len(), quiz_size)
        .into_iter()
        .map(|i| mcqs[i].clone())
        .collect()
}

/// 对测验题评分；题目编号为其在测验中的位置（从 0 开始）
pub fn evaluate_exam(supervisor: &Supervisor, state: &WorkflowState) -> StateUpdate {
    info!("正在评分，已作答 {} 题", state.user_answers.len());
    let questions = number_questions(&state.quiz_questions);
    let results = supervisor.evaluate(&questions, &state.user_answers);
    StateUpdate::new(Step::ExamEvaluated).exam_results(results)
}

pub fn number_questions(quiz: &[McqCandidate]) -> Vec<QuizQuestion> {
    quiz.iter()
        .enumerate()
        .map(|(idx, mcq)| QuizQuestion {
            id: idx as i64,
            mcq: mcq.clone(),
        })
        .collect()
}
