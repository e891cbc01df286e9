//! 数学类生成器：计算、公式、数值答案

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{generate_or_fallback, ping_model, McqGenerator, CONTENT_PREFIX_CHARS};
use crate::models::{AnswerOption, Category, Difficulty, HealthStatus, McqCandidate, McqOptions};
use crate::services::llm_service::{ChatModel, ChatRequest};
use crate::utils::text::clamp_chars;

const MATH_TEMPERATURE: f32 = 0.3;
const CAPABILITIES: &[&str] = &["math_mcqs", "math_problems", "calculations"];

pub struct MathGenerator {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl MathGenerator {
    pub fn new(model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    fn build_prompt(topic: &str, content: &str, count: usize) -> String {
        format!(
            r#"Create {count} mathematical multiple choice questions for: {topic}

Content: {content}

Focus on:
- Calculations and formulas
- Problem-solving steps
- Mathematical concepts
- Numerical answers

Return ONLY valid JSON:
[{{
    "question": "Calculate the value of...",
    "option_a": "Numerical answer 1",
    "option_b": "Numerical answer 2",
    "option_c": "Numerical answer 3",
    "option_d": "Numerical answer 4",
    "correct_answer": "A",
    "explanation": "Step-by-step solution",
    "difficulty": "medium"
}}]"#,
            content = clamp_chars(content, CONTENT_PREFIX_CHARS)
        )
    }

    /// 解析失败时的兜底题
    fn fallback(topic: &str) -> McqCandidate {
        McqCandidate {
            question: format!("What is the fundamental concept in {}?", topic),
            options: McqOptions {
                a: "Formula A".to_string(),
                b: "Formula B".to_string(),
                c: "Formula C".to_string(),
                d: "Formula D".to_string(),
            },
            correct_answer: AnswerOption::A,
            explanation: format!("This is the basic principle of {}", topic),
            difficulty: Some(Difficulty::Easy),
            topic: topic.to_string(),
            generated_by: Category::MATH,
        }
    }
}

#[async_trait]
impl McqGenerator for MathGenerator {
    fn category(&self) -> Category {
        Category::MATH
    }

    async fn health_check(&self) -> HealthStatus {
        ping_model(
            self.model.as_ref(),
            Category::MATH,
            "What is 2+2?",
            CAPABILITIES,
            self.timeout,
        )
        .await
    }

    async fn generate(&self, topic: &str, content: &str, count: usize) -> Vec<McqCandidate> {
        let request = ChatRequest::new(Self::build_prompt(topic, content, count), MATH_TEMPERATURE)
            .with_max_tokens(2048);
        generate_or_fallback(
            self.model.as_ref(),
            &request,
            self.timeout,
            topic,
            &Category::MATH,
            count,
            || Self::fallback(topic),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthState;
    use crate::test_support::{mcq_array_json, ScriptedModel};

    fn generator(model: ScriptedModel) -> MathGenerator {
        MathGenerator::new(Arc::new(model), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_generate_parses_backend_array() {
        let generator = generator(ScriptedModel::replying(&mcq_array_json(3)));
        let mcqs = generator.generate("Algebra", "Linear equations", 3).await;
        assert_eq!(mcqs.len(), 3);
        assert!(mcqs.iter().all(|m| m.generated_by == Category::MATH));
        assert_eq!(mcqs[0].correct_answer, AnswerOption::B);
    }

    #[tokio::test]
    async fn test_unparseable_response_yields_single_fallback() {
        let generator = generator(ScriptedModel::replying("The answer is 42."));
        let mcqs = generator.generate("Calculus", "", 3).await;
        assert_eq!(mcqs.len(), 1);
        assert_eq!(mcqs[0].topic, "Calculus");
        assert_eq!(mcqs[0].question, "What is the fundamental concept in Calculus?");
        assert_eq!(mcqs[0].options.a, "Formula A");
    }

    #[tokio::test]
    async fn test_backend_failure_yields_empty() {
        let generator = generator(ScriptedModel::failing());
        assert!(generator.generate("Calculus", "", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_clamps_content() {
        let content = "y".repeat(4000);
        let model = ScriptedModel::new(|request| {
            assert!(request.user.contains("Create 2 mathematical"));
            assert!(!request.user.contains(&"y".repeat(1001)));
            assert!(request.user.contains(&"y".repeat(1000)));
            Ok("[]".to_string())
        });
        let mcqs = generator(model).generate("Geometry", &content, 2).await;
        assert_eq!(mcqs.len(), 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let healthy = generator(ScriptedModel::replying("4")).health_check().await;
        assert_eq!(healthy.status, HealthState::Healthy);
        assert!(healthy.capabilities.contains("calculations"));

        let unhealthy = generator(ScriptedModel::failing()).health_check().await;
        assert_eq!(unhealthy.status, HealthState::Unhealthy);
        assert!(unhealthy.error.is_some());
        assert_eq!(unhealthy.category, Category::MATH);
    }
}
