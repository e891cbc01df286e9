use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 题目生成错误
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 委派错误
    #[error("委派错误: {0}")]
    Delegation(#[from] DelegationError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// LLM 服务错误（调用层面的失败）
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 调用超时
    #[error("LLM API调用超时 (模型: {model}, {secs}秒)")]
    Timeout { model: String, secs: u64 },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 题目生成错误
///
/// 两类失败必须区分：调用失败（没有拿到响应）与解析失败（拿到了响应但不符合格式）
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 后端调用失败
    #[error("调用失败: {0}")]
    Invocation(#[from] LlmError),
    /// 响应无法解析为题目数组
    #[error("无法解析主题 '{topic}' 的响应: {reason}")]
    Parse { topic: String, reason: String },
}

/// 委派错误
#[derive(Debug, Error)]
pub enum DelegationError {
    /// 注册表中找不到可用的生成器
    #[error("没有可用的生成器 (类别: {category})")]
    NoGenerator { category: String },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 大纲不存在
    #[error("Syllabus not found: {id}")]
    SyllabusNotFound { id: i64 },
    /// 大纲还没有题目
    #[error("No MCQs found for syllabus {syllabus_id}. Please generate MCQs first.")]
    NoQuestions { syllabus_id: i64 },
    /// 不支持的上传文件类型
    #[error("Only PDF and TXT files are supported: {filename}")]
    UnsupportedFile { filename: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl LlmError {
    /// 创建LLM API调用错误
    pub fn api_call_failed(
        model: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        LlmError::ApiCallFailed {
            model: model.into(),
            source: source.into(),
        }
    }
}

impl GenerationError {
    pub fn parse(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        GenerationError::Parse {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
