//! 选择题数据模型

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::models::Category;

/// 选项标签 A–D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
}

impl AnswerOption {
    pub const ALL: [AnswerOption; 4] = [
        AnswerOption::A,
        AnswerOption::B,
        AnswerOption::C,
        AnswerOption::D,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerOption::A => "A",
            AnswerOption::B => "B",
            AnswerOption::C => "C",
            AnswerOption::D => "D",
        }
    }

    /// 宽松解析：接受 "a"、"B)"、"C."、"Option D" 等写法
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        let stripped = upper
            .strip_prefix("OPTION")
            .map(|rest| rest.trim_start_matches([' ', '_', ':']))
            .unwrap_or(&upper);

        let mut chars = stripped.chars();
        let option = match chars.next()? {
            'A' => AnswerOption::A,
            'B' => AnswerOption::B,
            'C' => AnswerOption::C,
            'D' => AnswerOption::D,
            _ => return None,
        };
        match chars.next() {
            Some(next) if next.is_alphanumeric() => None,
            _ => Some(option),
        }
    }
}

impl Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// 四个选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOptions {
    #[serde(rename = "option_a")]
    pub a: String,
    #[serde(rename = "option_b")]
    pub b: String,
    #[serde(rename = "option_c")]
    pub c: String,
    #[serde(rename = "option_d")]
    pub d: String,
}

impl McqOptions {
    pub fn get(&self, option: AnswerOption) -> &str {
        match option {
            AnswerOption::A => &self.a,
            AnswerOption::B => &self.b,
            AnswerOption::C => &self.c,
            AnswerOption::D => &self.d,
        }
    }

    pub fn has_blank(&self) -> bool {
        AnswerOption::ALL
            .iter()
            .any(|option| self.get(*option).trim().is_empty())
    }
}

/// 候选选择题
///
/// 由一次生成器调用产生，产生后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqCandidate {
    pub question: String,
    #[serde(flatten)]
    pub options: McqOptions,
    pub correct_answer: AnswerOption,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub topic: String,
    pub generated_by: Category,
}

/// 后端返回的题目缺少必填字段
#[derive(Debug, Error, PartialEq, Eq)]
#[error("题目缺少必填字段: {0}")]
pub struct MissingField(pub &'static str);

impl McqCandidate {
    /// 从后端返回的 JSON 对象构建候选题
    ///
    /// question、四个选项、correct_answer 任一缺失都会被拒绝
    pub fn from_json(
        value: &JsonValue,
        topic: &str,
        generated_by: &Category,
    ) -> Result<Self, MissingField> {
        let obj = value.as_object().ok_or(MissingField("question"))?;

        let question = text_field(obj, "question").ok_or(MissingField("question"))?;
        let options = options_from(obj).ok_or(MissingField("options"))?;
        let correct_answer = text_field(obj, "correct_answer")
            .or_else(|| text_field(obj, "answer"))
            .and_then(|raw| AnswerOption::parse(&raw))
            .ok_or(MissingField("correct_answer"))?;

        Ok(Self {
            question,
            options,
            correct_answer,
            explanation: text_field(obj, "explanation").unwrap_or_default(),
            difficulty: text_field(obj, "difficulty").and_then(|raw| Difficulty::parse(&raw)),
            topic: topic.to_string(),
            generated_by: generated_by.clone(),
        })
    }

    /// 持久化前的最终校验
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.options.has_blank()
    }
}

/// 读取文本字段，数字和布尔值也转为文本（数学题的选项常是数字）
fn text_field(obj: &Map<String, JsonValue>, key: &str) -> Option<String> {
    let text = match obj.get(key)? {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn options_from(obj: &Map<String, JsonValue>) -> Option<McqOptions> {
    let flat = (
        text_field(obj, "option_a"),
        text_field(obj, "option_b"),
        text_field(obj, "option_c"),
        text_field(obj, "option_d"),
    );
    if let (Some(a), Some(b), Some(c), Some(d)) = flat {
        return Some(McqOptions { a, b, c, d });
    }

    // 兼容 "options": [..] 或 "options": {"A": ..}
    let texts: Vec<String> = match obj.get("options")? {
        JsonValue::Array(items) => items
            .iter()
            .take(4)
            .filter_map(|item| match item {
                JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        JsonValue::Object(map) => {
            let map: Map<String, JsonValue> = map
                .iter()
                .map(|(k, v)| (k.to_uppercase(), v.clone()))
                .collect();
            AnswerOption::ALL
                .iter()
                .filter_map(|option| text_field(&map, option.as_str()))
                .collect()
        }
        _ => return None,
    };

    let mut texts = texts.into_iter();
    match (texts.next(), texts.next(), texts.next(), texts.next()) {
        (Some(a), Some(b), Some(c), Some(d)) => Some(McqOptions { a, b, c, d }),
        _ => None,
    }
}

/// 测验题（带编号）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    #[serde(flatten)]
    pub mcq: McqCandidate,
}

impl QuizQuestion {
    /// 隐藏答案后的公开视图
    pub fn redacted(&self) -> PublicQuizQuestion {
        PublicQuizQuestion {
            id: self.id,
            question: self.mcq.question.clone(),
            options: self.mcq.options.clone(),
            topic: self.mcq.topic.clone(),
        }
    }
}

/// 不含答案和解析的测验题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicQuizQuestion {
    pub id: i64,
    pub question: String,
    #[serde(flatten)]
    pub options: McqOptions,
    pub topic: String,
}
