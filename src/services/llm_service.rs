//! LLM 服务 - 业务能力层
//!
//! 只负责"向模型发一条消息、拿回一段文本"，不关心题目、主题或流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Groq, Azure, Gemini 等）
//! - `ChatModel` trait 是后端的替换点，测试中用脚本化实现代替真实后端

use std::time::Duration;

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;

/// 一次对话请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature,
            max_tokens: 1024,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// 对话模型后端
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 发送请求，返回去掉首尾空白的响应文本
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// 带超时的调用，超时与调用失败同等对待
///
/// # 参数
/// - `model`: 后端模型
/// - `request`: 对话请求
/// - `limit`: 超时时间
///
/// # 返回
/// 返回非空响应文本；后端失败、超时或空响应都转为 `LlmError`
pub async fn complete_within(
    model: &dyn ChatModel,
    request: &ChatRequest,
    limit: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(limit, model.complete(request)).await {
        Ok(Ok(content)) if content.trim().is_empty() => Err(LlmError::EmptyContent {
            model: model.model_name().to_string(),
        }),
        Ok(Ok(content)) => Ok(content),
        Ok(Err(e)) => Err(LlmError::api_call_failed(model.model_name(), e)),
        Err(_) => {
            warn!("LLM 调用超时 ({}秒)，模型: {}", limit.as_secs(), model.model_name());
            Err(LlmError::Timeout {
                model: model.model_name().to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}

/// 基于 OpenAI 兼容接口的 LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }
}

#[async_trait]
impl ChatModel for LlmService {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", request.user.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = &request.system {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user.as_str())
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()?;

        let response = self.client.chat().create(api_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
