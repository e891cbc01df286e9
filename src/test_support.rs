//! 单元测试共用的测试替身和数据

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnswerOption, Category, McqCandidate, McqOptions};
use crate::services::llm_service::{ChatModel, ChatRequest};

type Script = dyn Fn(&ChatRequest) -> Result<String> + Send + Sync;

/// 按脚本应答的模型
pub(crate) struct ScriptedModel {
    script: Box<Script>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub(crate) fn new(
        script: impl Fn(&ChatRequest) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 总是返回同一段文本
    pub(crate) fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// 总是调用失败
    pub(crate) fn failing() -> Self {
        Self::new(|_| anyhow::bail!("backend unreachable"))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.script)(request)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// 构造一道测试题
pub(crate) fn sample_mcq(topic: &str, question: &str, answer: AnswerOption) -> McqCandidate {
    McqCandidate {
        question: question.to_string(),
        options: McqOptions {
            a: "first".to_string(),
            b: "second".to_string(),
            c: "third".to_string(),
            d: "fourth".to_string(),
        },
        correct_answer: answer,
        explanation: format!("explains {}", question),
        difficulty: None,
        topic: topic.to_string(),
        generated_by: Category::GENERAL,
    }
}

/// 合法的题目数组响应
pub(crate) fn mcq_array_json(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"question": "Question {i}?", "option_a": "a{i}", "option_b": "b{i}", "option_c": "c{i}", "option_d": "d{i}", "correct_answer": "B", "explanation": "because {i}", "difficulty": "medium"}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// (题号, 答案) → 答案表
pub(crate) fn answers_from_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(id, answer)| (id.to_string(), answer.to_string()))
        .collect()
}
