use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// 单个生成器的健康检查结果，每次按需重新计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub category: Category,
    pub status: HealthState,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn healthy(category: Category, capabilities: &[&str]) -> Self {
        Self {
            category,
            status: HealthState::Healthy,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            error: None,
        }
    }

    pub fn unhealthy(category: Category, error: impl Into<String>) -> Self {
        Self {
            category,
            status: HealthState::Unhealthy,
            capabilities: BTreeSet::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthState::Healthy
    }
}

/// 全部生成器的健康汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentsHealth {
    pub agents: BTreeMap<Category, HealthStatus>,
    pub total_agents: usize,
    pub healthy_agents: usize,
}

impl AgentsHealth {
    pub fn from_statuses(statuses: impl IntoIterator<Item = HealthStatus>) -> Self {
        let agents: BTreeMap<Category, HealthStatus> = statuses
            .into_iter()
            .map(|status| (status.category.clone(), status))
            .collect();
        let healthy_agents = agents.values().filter(|s| s.is_healthy()).count();
        Self {
            total_agents: agents.len(),
            healthy_agents,
            agents,
        }
    }
}
