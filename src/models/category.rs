//! 生成器类别
//!
//! 类别只是一个标签，用于在 Supervisor 的注册表中查找对应的生成器。
//! 新增一种生成器只需要一个新的标签，不需要修改 Supervisor。

use std::borrow::Cow;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// 生成器类别标签
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(Cow<'static, str>);

impl Category {
    /// 数学类
    pub const MATH: Category = Category(Cow::Borrowed("math"));
    /// 通用知识类（也是默认兜底类别）
    pub const GENERAL: Category = Category(Cow::Borrowed("general"));

    pub fn new(label: impl Into<String>) -> Self {
        Category(Cow::Owned(label.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        match label {
            "math" => Category::MATH,
            "general" => Category::GENERAL,
            other => Category::new(other),
        }
    }
}
