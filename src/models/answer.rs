use serde::{Deserialize, Serialize};

/// 题目答案：单值或有序列表
///
/// 多选题的答案永远是列表，即使只有一个元素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Single(String),
    Multiple(Vec<String>),
}

impl AnswerValue {
    pub fn is_list(&self) -> bool {
        matches!(self, AnswerValue::Multiple(_))
    }

    /// 所有答案值（单值视为长度为 1 的列表）
    pub fn values(&self) -> Vec<&str> {
        match self {
            AnswerValue::Single(value) => vec![value.as_str()],
            AnswerValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerValue::Single(value) => write!(f, "{}", value),
            AnswerValue::Multiple(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}
