use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件路径
const DEFAULT_CONFIG_FILE: &str = "exam_prep.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次 LLM 调用的超时时间（秒）
    pub llm_timeout_secs: u64,
    // --- 流程配置 ---
    /// 每个主题生成的题目数量
    pub mcqs_per_topic: usize,
    /// 测验题目数量上限
    pub quiz_size: usize,
    /// 同时委派的主题数量
    pub max_concurrent_topics: usize,
    // --- 批处理配置 ---
    /// 同时处理的大纲数量
    pub max_concurrent_syllabi: usize,
    /// 大纲文件存放目录
    pub syllabus_folder: String,
    /// 报告输出文件（JSON Lines）
    pub report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model_name: "gemma2-9b-it".to_string(),
            llm_timeout_secs: 30,
            mcqs_per_topic: 3,
            quiz_size: 10,
            max_concurrent_topics: 4,
            max_concurrent_syllabi: 2,
            syllabus_folder: "syllabi".to_string(),
            report_file: "exam_report.jsonl".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let path = std::env::var("EXAM_PREP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };

        base.with_env_overrides()
    }

    /// 只使用环境变量覆盖默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_timeout_secs: env_parse("LLM_TIMEOUT_SECS", "u64")?.unwrap_or(self.llm_timeout_secs),
            mcqs_per_topic: env_parse("MCQS_PER_TOPIC", "usize")?.unwrap_or(self.mcqs_per_topic),
            quiz_size: env_parse("QUIZ_SIZE", "usize")?.unwrap_or(self.quiz_size),
            max_concurrent_topics: env_parse("MAX_CONCURRENT_TOPICS", "usize")?
                .unwrap_or(self.max_concurrent_topics),
            max_concurrent_syllabi: env_parse("MAX_CONCURRENT_SYLLABI", "usize")?
                .unwrap_or(self.max_concurrent_syllabi),
            syllabus_folder: env_string("SYLLABUS_FOLDER").unwrap_or(self.syllabus_folder),
            report_file: env_string("REPORT_FILE").unwrap_or(self.report_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            llm_model_name = "llama-3.1-8b-instant"
            quiz_size = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.llm_model_name, "llama-3.1-8b-instant");
        assert_eq!(config.quiz_size, 5);
        assert_eq!(config.mcqs_per_topic, 3);
        assert_eq!(config.llm_timeout_secs, 30);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("EXAM_PREP_TEST_BAD_NUMBER", "ten");
        let result: Result<Option<usize>, _> = env_parse("EXAM_PREP_TEST_BAD_NUMBER", "usize");
        assert!(matches!(result, Err(ConfigError::EnvVarParseFailed { .. })));
        std::env::remove_var("EXAM_PREP_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_env_parse_missing_is_none() {
        let result: Option<u64> = env_parse("EXAM_PREP_TEST_UNSET_VAR", "u64").unwrap();
        assert!(result.is_none());
    }
}
