//! 主题分类 - 业务能力层
//!
//! 关键词启发式优先于模型判断：主题命中关键词就直接判为数学类；
//! 模型调用失败时退化为纯关键词分类，错误不向外传播。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::Category;
use crate::services::llm_service::{complete_within, ChatModel, ChatRequest};
use crate::utils::text::clamp_chars;

/// 数学类关键词（小写，子串匹配）
pub const MATH_KEYWORDS: &[&str] = &[
    "math",
    "algebra",
    "geometry",
    "calculus",
    "trigonometry",
    "statistics",
    "arithmetic",
    "equation",
    "formula",
    "number",
];

const CLASSIFIER_TEMPERATURE: f32 = 0.1;
const EXCERPT_CHARS: usize = 500;

/// 主题分类器
pub struct TopicClassifier {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl TopicClassifier {
    pub fn new(model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// 主题 → 生成器类别，永不失败
    pub async fn classify(&self, topic: &str, content_excerpt: &str) -> Category {
        if mentions_math(topic) {
            debug!("主题 '{}' 命中数学关键词", topic);
            return Category::MATH;
        }

        let request = ChatRequest::new(build_prompt(topic, content_excerpt), CLASSIFIER_TEMPERATURE)
            .with_max_tokens(16);

        match complete_within(self.model.as_ref(), &request, self.timeout).await {
            Ok(label) => {
                let label = label.trim().to_lowercase();
                debug!("模型分类结果: '{}' → '{}'", topic, label);
                if mentions_math(&label) {
                    Category::MATH
                } else {
                    Category::GENERAL
                }
            }
            Err(e) => {
                warn!("主题分类调用失败，退化为关键词分类: {}", e);
                keyword_category(topic)
            }
        }
    }
}

/// 纯关键词分类
pub fn keyword_category(topic: &str) -> Category {
    if mentions_math(topic) {
        Category::MATH
    } else {
        Category::GENERAL
    }
}

fn mentions_math(text: &str) -> bool {
    let lowered = text.to_lowercase();
    MATH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

fn build_prompt(topic: &str, content: &str) -> String {
    format!(
        r#"Classify this topic as either "math" or "general":

Topic: {}
Content: {}

Math topics include: algebra, geometry, calculus, statistics, trigonometry, arithmetic, equations, formulas, numbers
General topics include: science, history, literature, biology, chemistry, physics concepts, social studies

Return only: "math" or "general""#,
        topic,
        clamp_chars(content, EXCERPT_CHARS)
    )
}
