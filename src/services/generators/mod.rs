//! 题目生成器 - 业务能力层
//!
//! 每种生成器实现同一个能力接口 `McqGenerator`（健康检查 + 生成），
//! 由 Supervisor 按类别标签持有。新增类别只需要新增实现并注册。
//!
//! 生成的两种失败必须区分：
//! - 调用失败（超时、不可达）→ 空列表，上游视为"跳过该主题"
//! - 解析失败（有响应但不是题目数组）→ 单道兜底题

pub mod general;
pub mod math;

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::{Category, HealthStatus, McqCandidate};
use crate::services::llm_service::{complete_within, ChatModel, ChatRequest};
use crate::utils::logging::truncate_text;

pub use general::GeneralGenerator;
pub use math::MathGenerator;

/// 提示词中参考内容的最大字符数
pub const CONTENT_PREFIX_CHARS: usize = 1000;

/// 贪婪匹配第一个 '[' 到最后一个 ']'
static ARRAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array pattern"));

/// 题目生成能力
#[async_trait]
pub trait McqGenerator: Send + Sync {
    /// 生成器类别标签
    fn category(&self) -> Category;

    /// 一次简单的往返探测，所有失败都记录在返回的状态里
    async fn health_check(&self) -> HealthStatus;

    /// 为主题生成至多 `count` 道题
    async fn generate(&self, topic: &str, content: &str, count: usize) -> Vec<McqCandidate>;
}

/// 健康探测：能拿到任何响应即视为健康
pub(crate) async fn ping_model(
    model: &dyn ChatModel,
    category: Category,
    question: &str,
    capabilities: &[&str],
    timeout: Duration,
) -> HealthStatus {
    let request = ChatRequest::new(question, 0.0).with_max_tokens(16);
    match complete_within(model, &request, timeout).await {
        Ok(_) => HealthStatus::healthy(category, capabilities),
        Err(e) => {
            warn!("生成器 {} 健康检查失败: {}", category, e);
            HealthStatus::unhealthy(category, e.to_string())
        }
    }
}

/// 请求并解析题目，保留两种失败的区别
pub(crate) async fn request_candidates(
    model: &dyn ChatModel,
    request: &ChatRequest,
    timeout: Duration,
    topic: &str,
    category: &Category,
    count: usize,
) -> Result<Vec<McqCandidate>, GenerationError> {
    let response = complete_within(model, request, timeout).await?;
    debug!("主题 '{}' 的生成响应: {}", topic, truncate_text(&response, 200));
    parse_candidates(&response, topic, category, count)
}

/// 调用失败 → 空列表；解析失败 → 兜底题
pub(crate) async fn generate_or_fallback(
    model: &dyn ChatModel,
    request: &ChatRequest,
    timeout: Duration,
    topic: &str,
    category: &Category,
    count: usize,
    fallback: impl FnOnce() -> McqCandidate,
) -> Vec<McqCandidate> {
    if count == 0 {
        return Vec::new();
    }

    match request_candidates(model, request, timeout, topic, category, count).await {
        Ok(mcqs) => mcqs,
        Err(GenerationError::Parse { reason, .. }) => {
            warn!("[{}] 主题 '{}' 响应无法解析 ({})，使用兜底题", category, topic, reason);
            vec![fallback()]
        }
        Err(GenerationError::Invocation(e)) => {
            warn!("[{}] 主题 '{}' 生成调用失败: {}", category, topic, e);
            Vec::new()
        }
    }
}

/// 宽松解析：找到第一个合法的数组，逐项转换，不合法的项丢弃
pub fn parse_candidates(
    response: &str,
    topic: &str,
    category: &Category,
    count: usize,
) -> Result<Vec<McqCandidate>, GenerationError> {
    let items = extract_json_array(response)
        .ok_or_else(|| GenerationError::parse(topic, "响应中没有合法的 JSON 数组"))?;

    let total = items.len();
    let mcqs: Vec<McqCandidate> = items
        .iter()
        .filter_map(|item| match McqCandidate::from_json(item, topic, category) {
            Ok(mcq) => Some(mcq),
            Err(e) => {
                warn!("丢弃不完整的题目 (主题: {}): {}", topic, e);
                None
            }
        })
        .take(count)
        .collect();

    if mcqs.is_empty() {
        return Err(GenerationError::parse(
            topic,
            format!("数组中 {} 项均不是有效题目", total),
        ));
    }
    Ok(mcqs)
}

/// 定位响应中第一个格式正确的 JSON 数组
pub fn extract_json_array(text: &str) -> Option<Vec<JsonValue>> {
    if let Some(found) = ARRAY_PATTERN.find(text) {
        if let Ok(JsonValue::Array(items)) = serde_json::from_str(found.as_str()) {
            return Some(items);
        }
    }

    // 贪婪匹配失败（例如数组后面还跟着带方括号的说明），逐个 '[' 尝试流式解析
    text.match_indices('[').find_map(|(idx, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[idx..]).into_iter::<JsonValue>();
        match stream.next() {
            Some(Ok(JsonValue::Array(items))) => Some(items),
            _ => None,
        }
    })
}
