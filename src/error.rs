use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 单篇文档流水线错误
    #[error("流水线错误: {0}")]
    Pipeline(#[from] PipelineError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件 {path} 失败: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件 {path} 失败: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// JSON 序列化/解析失败
    #[error("JSON 处理失败: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
    /// TOML 解析失败
    #[error("解析 TOML 文件 {path} 失败: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置项取值非法
    #[error("配置项 {field} 的值 {value:?} 非法: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    /// 缺少默认配置文件
    #[error("缺少配置文件: {path}")]
    MissingFile { path: String },
}

/// 单篇文档处理中的致命错误
///
/// 任一阶段返回此错误，该文档的后续阶段全部跳过，文档被拒绝
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// 节点不匹配任何已知题型
    #[error("无法识别题型 (位置 {position}): {reason}")]
    Classification { position: String, reason: String },
    /// 已确定题型但必需字段缺失或格式错误
    #[error("字段提取失败 ({field}): {reason}")]
    Extraction {
        question: Option<u32>,
        field: String,
        reason: String,
    },
    /// 题号断档或重复
    #[error("题号不连续: 题目 {question} 期望题号 {expected}，实际 {found}")]
    Continuity {
        question: u32,
        expected: u32,
        found: u32,
    },
    /// 缺答案或答案形状与题型不符
    #[error("答案绑定失败 (题目 {question}): {reason}")]
    Binding { question: u32, reason: String },
}

impl PipelineError {
    pub fn extraction(
        question: Option<u32>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::Extraction {
            question,
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn binding(question: u32, reason: impl Into<String>) -> Self {
        PipelineError::Binding {
            question,
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> FindingCategory {
        match self {
            PipelineError::Classification { .. } => FindingCategory::Classification,
            PipelineError::Extraction { .. } => FindingCategory::Extraction,
            PipelineError::Continuity { .. } => FindingCategory::Continuity,
            PipelineError::Binding { .. } => FindingCategory::Binding,
        }
    }

    pub fn question(&self) -> Option<u32> {
        match self {
            PipelineError::Classification { .. } => None,
            PipelineError::Extraction { question, .. } => *question,
            PipelineError::Continuity { question, .. } | PipelineError::Binding { question, .. } => {
                Some(*question)
            }
        }
    }
}

impl From<PipelineError> for Finding {
    fn from(err: PipelineError) -> Self {
        Finding {
            severity: Severity::Fatal,
            category: err.category(),
            question: err.question(),
            message: err.to_string(),
        }
    }
}

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 致命：文档被拒绝
    Fatal,
    /// 可恢复：只记录，不阻止输出
    Warning,
}

/// 问题类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingCategory {
    Classification,
    Extraction,
    Continuity,
    Binding,
    Structural,
    Consistency,
    Content,
    /// 读写失败、超时、任务崩溃
    Runtime,
}

/// 单条校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: FindingCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<u32>,
    pub message: String,
}

impl Finding {
    pub fn fatal(
        category: FindingCategory,
        question: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Fatal,
            category,
            question,
            message: message.into(),
        }
    }

    pub fn warning(
        category: FindingCategory,
        question: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            question,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Fatal => "致命",
            Severity::Warning => "警告",
        };
        match self.question {
            Some(number) => write!(f, "[{}] 题目 {}: {}", severity, number, self.message),
            None => write!(f, "[{}] {}", severity, self.message),
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::Json { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建配置项非法错误
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 单篇文档流水线结果类型
pub type PipelineResult<T> = Result<T, PipelineError>;
