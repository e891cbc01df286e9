//! 大纲主题提取 - 业务能力层

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::services::llm_service::{complete_within, ChatModel, ChatRequest};
use crate::utils::text::clamp_chars;

/// 没有提取到任何主题时使用的哨兵主题
pub const SENTINEL_TOPIC: &str = "General Topics";

const SYLLABUS_PREFIX_CHARS: usize = 2000;
const MAX_LINE_TOPICS: usize = 10;
const EXTRACTION_TEMPERATURE: f32 = 0.2;

/// 非贪婪匹配第一个方括号列表
static LIST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid list pattern"));

/// 行首的列表标记：- * • 1. 2)
static BULLET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]+|\d+[.)])\s*").expect("valid bullet pattern"));

pub struct TopicExtractor {
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl TopicExtractor {
    pub fn new(model: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// 提取主题；后端调用失败返回错误，由调用方决定兜底
    pub async fn extract_topics(&self, syllabus_content: &str) -> Result<Vec<String>, LlmError> {
        let prompt = format!(
            r#"Extract 5-10 key topics from this syllabus content. Return ONLY a JSON list of strings.

Syllabus: {}

Return format: ["Topic 1", "Topic 2", "Topic 3"]"#,
            clamp_chars(syllabus_content, SYLLABUS_PREFIX_CHARS)
        );

        let request = ChatRequest::new(prompt, EXTRACTION_TEMPERATURE);
        let response = complete_within(self.model.as_ref(), &request, self.timeout).await?;
        debug!("主题提取响应: {}", response);

        let topics = parse_topics(&response);
        info!("提取到 {} 个主题: {:?}", topics.len(), topics);
        Ok(topics)
    }
}

/// 解析模型返回的主题列表
///
/// - 有方括号列表：按 JSON 解析（容忍单引号），解析失败给出三个通用主题
/// - 没有列表：逐行读取，最多 10 行
/// - 结果为空：哨兵主题
pub fn parse_topics(response: &str) -> Vec<String> {
    let topics = match LIST_PATTERN.find(response) {
        Some(found) => match parse_list(found.as_str()) {
            Some(topics) => topics,
            None => {
                return vec![
                    SENTINEL_TOPIC.to_string(),
                    "Key Concepts".to_string(),
                    "Important Points".to_string(),
                ]
            }
        },
        None => response
            .lines()
            .map(clean_line)
            .filter(|line| !line.is_empty())
            .take(MAX_LINE_TOPICS)
            .collect(),
    };

    if topics.is_empty() {
        vec![SENTINEL_TOPIC.to_string()]
    } else {
        topics
    }
}

fn parse_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&raw.replace('\'', "\"")))
        .ok()?;
    Some(
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

fn clean_line(line: &str) -> String {
    let line = BULLET_PATTERN.replace(line.trim(), "");
    line.trim().trim_matches(|c: char| c == '"' || c == '\'').trim().to_string()
}
