use serde::{Deserialize, Serialize};

use crate::models::{Category, McqCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationStatus {
    Success,
    Failed,
}

/// 一次委派的结果（每个主题一个），只在流程内部流转，不直接持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationResult {
    pub topic: String,
    /// 实际执行生成的类别；失败时为空
    pub agent_used: Option<Category>,
    pub mcqs: Vec<McqCandidate>,
    pub status: DelegationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DelegationResult {
    pub fn success(topic: &str, agent_used: Category, mcqs: Vec<McqCandidate>) -> Self {
        Self {
            topic: topic.to_string(),
            agent_used: Some(agent_used),
            mcqs,
            status: DelegationStatus::Success,
            error: None,
        }
    }

    pub fn failed(topic: &str, error: impl Into<String>) -> Self {
        Self {
            topic: topic.to_string(),
            agent_used: None,
            mcqs: Vec::new(),
            status: DelegationStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DelegationStatus::Success
    }

    pub fn count(&self) -> usize {
        self.mcqs.len()
    }
}
