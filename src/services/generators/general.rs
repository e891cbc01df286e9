//! 通用知识类生成器：概念、定义、事实。也是 Supervisor 的默认兜底生成器。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{generate_or_fallback, ping_model, McqGenerator, CONTENT_PREFIX_CHARS};
use crate::models::{AnswerOption, Category, Difficulty, HealthStatus, McqCandidate, McqOptions};
use crate::services::llm_service::{ChatModel, ChatRequest};
use crate::utils::text::clamp_chars;

const GENERAL_TEMPERATURE: f32 = 0.5;
const CAPABILITIES: &[&str] = &["general_mcqs", "conceptual_questions", "theory"];

pub struct GeneralGenerator {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl GeneralGenerator {
    pub fn new(model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    fn build_prompt(topic: &str, content: &str, count: usize) -> String {
        format!(
            r#"Create {count} conceptual multiple choice questions for: {topic}

Content: {content}

Focus on:
- Theoretical concepts
- Definitions and explanations
- Understanding and application
- Factual knowledge

Return ONLY valid JSON:
[{{
    "question": "What is the definition of...",
    "option_a": "Concept explanation 1",
    "option_b": "Concept explanation 2",
    "option_c": "Concept explanation 3",
    "option_d": "Concept explanation 4",
    "correct_answer": "A",
    "explanation": "Detailed explanation",
    "difficulty": "medium"
}}]"#,
            content = clamp_chars(content, CONTENT_PREFIX_CHARS)
        )
    }

    fn fallback(topic: &str) -> McqCandidate {
        McqCandidate {
            question: format!("What is the main concept of {}?", topic),
            options: McqOptions {
                a: "Concept A".to_string(),
                b: "Concept B".to_string(),
                c: "Concept C".to_string(),
                d: "Concept D".to_string(),
            },
            correct_answer: AnswerOption::A,
            explanation: format!("This explains the core idea of {}", topic),
            difficulty: Some(Difficulty::Easy),
            topic: topic.to_string(),
            generated_by: Category::GENERAL,
        }
    }
}

#[async_trait]
impl McqGenerator for GeneralGenerator {
    fn category(&self) -> Category {
        Category::GENERAL
    }

    async fn health_check(&self) -> HealthStatus {
        ping_model(
            self.model.as_ref(),
            Category::GENERAL,
            "What is the capital of France?",
            CAPABILITIES,
            self.timeout,
        )
        .await
    }

    async fn generate(&self, topic: &str, content: &str, count: usize) -> Vec<McqCandidate> {
        let request =
            ChatRequest::new(Self::build_prompt(topic, content, count), GENERAL_TEMPERATURE)
                .with_max_tokens(2048);
        generate_or_fallback(
            self.model.as_ref(),
            &request,
            self.timeout,
            topic,
            &Category::GENERAL,
            count,
            || Self::fallback(topic),
        )
        .await
    }
}
