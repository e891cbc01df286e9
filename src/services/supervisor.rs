//! Supervisor - 业务能力层
//!
//! 持有生成器注册表（类别 → 生成器），负责：
//! 1. 分类主题并选择生成器
//! 2. 委派前做健康检查，不健康时改用默认生成器
//! 3. 汇总生成结果，任何失败都转为 `DelegationStatus::Failed`
//! 4. 测验评分

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, DelegationError};
use crate::models::{
    AgentsHealth, Category, DelegationResult, EvaluationResult, McqCandidate, QuizQuestion,
};
use crate::services::classifier::TopicClassifier;
use crate::services::generators::{GeneralGenerator, MathGenerator, McqGenerator};
use crate::services::llm_service::ChatModel;
use crate::services::scoring;

pub struct Supervisor {
    classifier: TopicClassifier,
    generators: HashMap<Category, Arc<dyn McqGenerator>>,
    default_category: Category,
}

impl Supervisor {
    /// 注册数学和通用两个生成器，通用为默认
    pub fn new(config: &Config, model: Arc<dyn ChatModel>) -> Self {
        let timeout = Duration::from_secs(config.llm_timeout_secs);
        Self::with_classifier(TopicClassifier::new(model.clone(), timeout))
            .register(Arc::new(MathGenerator::new(model.clone(), timeout)))
            .register(Arc::new(GeneralGenerator::new(model, timeout)))
    }

    /// 空注册表，默认类别为通用类
    pub fn with_classifier(classifier: TopicClassifier) -> Self {
        Self {
            classifier,
            generators: HashMap::new(),
            default_category: Category::GENERAL,
        }
    }

    /// 注册生成器，同类别的旧生成器会被替换
    pub fn register(mut self, generator: Arc<dyn McqGenerator>) -> Self {
        self.generators.insert(generator.category(), generator);
        self
    }

    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.generators.keys().cloned().collect();
        categories.sort();
        categories
    }

    /// 检查所有生成器的健康状态（探测相互独立，并发执行）
    pub async fn check_agents_health(&self) -> AgentsHealth {
        let statuses = join_all(self.generators.values().map(|g| g.health_check())).await;
        let health = AgentsHealth::from_statuses(statuses);
        info!(
            "生成器健康检查完成: {}/{} 健康",
            health.healthy_agents, health.total_agents
        );
        health
    }

    /// 把一个主题委派给合适的生成器，永不失败
    pub async fn delegate(&self, topic: &str, content: &str, count: usize) -> DelegationResult {
        match self.try_delegate(topic, content, count).await {
            Ok((agent_used, mcqs)) => {
                info!(
                    "主题 '{}' 由 {} 生成器生成了 {} 道题",
                    topic,
                    agent_used,
                    mcqs.len()
                );
                DelegationResult::success(topic, agent_used, mcqs)
            }
            Err(e) => {
                warn!("主题 '{}' 委派失败: {}", topic, e);
                DelegationResult::failed(topic, e.to_string())
            }
        }
    }

    async fn try_delegate(
        &self,
        topic: &str,
        content: &str,
        count: usize,
    ) -> AppResult<(Category, Vec<McqCandidate>)> {
        let mut category = self.classifier.classify(topic, content).await;
        info!("委派主题 '{}' → {} 生成器", topic, category);

        let mut generator = match self.generators.get(&category) {
            Some(generator) => generator.clone(),
            None => {
                category = self.default_category.clone();
                self.default_generator()?
            }
        };

        let health = generator.health_check().await;
        if !health.is_healthy() {
            warn!(
                "{} 生成器不健康 ({})，改用 {} 生成器",
                category,
                health.error.as_deref().unwrap_or("unknown"),
                self.default_category
            );
            generator = self.default_generator()?;
            category = self.default_category.clone();
        }

        let mcqs = generator.generate(topic, content, count).await;
        Ok((category, mcqs))
    }

    fn default_generator(&self) -> Result<Arc<dyn McqGenerator>, DelegationError> {
        self.generators
            .get(&self.default_category)
            .cloned()
            .ok_or_else(|| DelegationError::NoGenerator {
                category: self.default_category.to_string(),
            })
    }

    /// 测验评分
    pub fn evaluate(
        &self,
        questions: &[QuizQuestion],
        answers: &HashMap<String, String>,
    ) -> EvaluationResult {
        scoring::evaluate(questions, answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerOption, DelegationStatus, HealthStatus};
    use crate::test_support::{sample_mcq, ScriptedModel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 固定健康状态、返回固定题目的生成器
    struct StubGenerator {
        category: Category,
        healthy: bool,
        generated: AtomicUsize,
    }

    impl StubGenerator {
        fn new(label: &str, healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                category: Category::from(label),
                healthy,
                generated: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl McqGenerator for StubGenerator {
        fn category(&self) -> Category {
            self.category.clone()
        }

        async fn health_check(&self) -> HealthStatus {
            if self.healthy {
                HealthStatus::healthy(self.category.clone(), &["stub"])
            } else {
                HealthStatus::unhealthy(self.category.clone(), "health check failed")
            }
        }

        async fn generate(&self, topic: &str, _content: &str, count: usize) -> Vec<McqCandidate> {
            self.generated.fetch_add(1, Ordering::SeqCst);
            (0..count)
                .map(|i| {
                    let mut mcq = sample_mcq(topic, &format!("{} #{}", topic, i), AnswerOption::A);
                    mcq.generated_by = self.category.clone();
                    mcq
                })
                .collect()
        }
    }

    fn classifier(reply: &str) -> TopicClassifier {
        TopicClassifier::new(Arc::new(ScriptedModel::replying(reply)), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_delegate_routes_math_topic() {
        let math = StubGenerator::new("math", true);
        let general = StubGenerator::new("general", true);
        let supervisor = Supervisor::with_classifier(classifier("general"))
            .register(math.clone())
            .register(general.clone());

        let result = supervisor.delegate("Geometry of circles", "", 3).await;
        assert_eq!(result.status, DelegationStatus::Success);
        assert_eq!(result.agent_used, Some(Category::MATH));
        assert_eq!(result.count(), 3);
        assert_eq!(math.generated.load(Ordering::SeqCst), 1);
        assert_eq!(general.generated.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unhealthy_generator_is_substituted() {
        let math = StubGenerator::new("math", false);
        let general = StubGenerator::new("general", true);
        let supervisor = Supervisor::with_classifier(classifier("math"))
            .register(math.clone())
            .register(general.clone());

        let result = supervisor.delegate("Algebra", "", 2).await;
        assert!(result.is_success());
        assert_eq!(result.agent_used, Some(Category::GENERAL));
        assert!(result.mcqs.iter().all(|m| m.generated_by == Category::GENERAL));
        assert_eq!(math.generated.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_category_uses_default() {
        let general = StubGenerator::new("general", true);
        let supervisor = Supervisor::with_classifier(classifier("math")).register(general.clone());

        let result = supervisor.delegate("Calculus", "", 1).await;
        assert!(result.is_success());
        assert_eq!(result.agent_used, Some(Category::GENERAL));
    }

    #[tokio::test]
    async fn test_missing_default_generator_fails_softly() {
        let math = StubGenerator::new("math", false);
        let supervisor = Supervisor::with_classifier(classifier("math")).register(math);

        let result = supervisor.delegate("Algebra", "", 3).await;
        assert_eq!(result.status, DelegationStatus::Failed);
        assert!(result.mcqs.is_empty());
        assert!(result.agent_used.is_none());
        assert!(result.error.unwrap().contains("general"));
    }

    #[tokio::test]
    async fn test_check_agents_health_counts() {
        let supervisor = Supervisor::with_classifier(classifier("general"))
            .register(StubGenerator::new("math", false))
            .register(StubGenerator::new("general", true))
            .register(StubGenerator::new("physics", true));

        let health = supervisor.check_agents_health().await;
        assert_eq!(health.total_agents, 3);
        assert_eq!(health.healthy_agents, 2);
        assert!(!health.agents[&Category::MATH].is_healthy());
        assert_eq!(supervisor.categories().len(), 3);
    }

    #[tokio::test]
    async fn test_default_registry_with_real_generators() {
        let model: Arc<dyn ChatModel> = Arc::new(ScriptedModel::failing());
        let supervisor = Supervisor::new(&Config::default(), model);
        assert_eq!(supervisor.categories(), vec![Category::GENERAL, Category::MATH]);

        // 后端不可达：健康检查失败 → 改用通用生成器 → 调用失败返回空列表
        let result = supervisor.delegate("Algebra", "", 3).await;
        assert!(result.is_success());
        assert_eq!(result.agent_used, Some(Category::GENERAL));
        assert!(result.mcqs.is_empty());
    }
}
