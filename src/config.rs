use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 默认配置文件名
pub const DEFAULT_SETTINGS_FILE: &str = "settings.default.toml";
/// 本地覆盖配置文件名
pub const LOCAL_SETTINGS_FILE: &str = "settings.local.toml";

/// 程序配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// HTML 源文件目录
    pub input_root: String,
    /// 输出根目录
    pub output_root: String,
    /// JSON 输出子目录
    pub json_subdir: String,
    /// 分块输出子目录（核心流程只读不写）
    pub chunks_subdir: String,
    /// 清单文件名（核心流程只读不写）
    pub manifest_filename: String,
    /// 汇总报告文件名
    pub report_filename: String,
    /// 同时处理的文档数量
    pub max_concurrent_docs: usize,
    /// 单篇文档超时秒数，0 表示不限
    pub doc_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: "input".to_string(),
            output_root: "output".to_string(),
            json_subdir: "json".to_string(),
            chunks_subdir: "chunks".to_string(),
            manifest_filename: "manifest.json".to_string(),
            report_filename: "report.json".to_string(),
            max_concurrent_docs: 8,
            doc_timeout_secs: 30,
            verbose_logging: false,
            output_log_file: "ingest.log".to_string(),
        }
    }
}

/// 解析后的路径集合
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub json_dir: PathBuf,
    pub chunks_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub report_path: PathBuf,
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从配置目录加载：默认文件 → 本地覆盖文件（深度合并）→ 环境变量
    ///
    /// 相对路径按配置目录解析
    pub fn load(config_dir: &Path) -> AppResult<Self> {
        let default_path = config_dir.join(DEFAULT_SETTINGS_FILE);
        if !default_path.exists() {
            return Err(ConfigError::MissingFile {
                path: default_path.display().to_string(),
            }
            .into());
        }

        let mut merged = read_toml_table(&default_path)?;
        let local_path = config_dir.join(LOCAL_SETTINGS_FILE);
        if local_path.exists() {
            let local = read_toml_table(&local_path)?;
            deep_merge(&mut merged, local);
        }

        let file: SettingsFile = toml::Value::Table(merged)
            .try_into()
            .map_err(|source| FileError::TomlParseFailed {
                path: default_path.display().to_string(),
                source,
            })?;

        let mut config = Self::default();
        file.apply(&mut config);
        config.input_root = resolve_against(config_dir, &config.input_root);
        config.output_root = resolve_against(config_dir, &config.output_root);

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            input_root: std::env::var("INPUT_ROOT").unwrap_or(default.input_root),
            output_root: std::env::var("OUTPUT_ROOT").unwrap_or(default.output_root),
            json_subdir: std::env::var("JSON_SUBDIR").unwrap_or(default.json_subdir),
            chunks_subdir: std::env::var("CHUNKS_SUBDIR").unwrap_or(default.chunks_subdir),
            manifest_filename: std::env::var("MANIFEST_FILENAME").unwrap_or(default.manifest_filename),
            report_filename: std::env::var("REPORT_FILENAME").unwrap_or(default.report_filename),
            max_concurrent_docs: std::env::var("MAX_CONCURRENT_DOCS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_docs),
            doc_timeout_secs: std::env::var("DOC_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.doc_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 校验配置取值
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_docs == 0 {
            return Err(AppError::invalid_config(
                "max_concurrent_docs",
                "0",
                "并发度必须是正整数",
            ));
        }
        for (field, value) in [
            ("input_root", &self.input_root),
            ("output_root", &self.output_root),
            ("json_subdir", &self.json_subdir),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::invalid_config(field, value.as_str(), "路径不能为空"));
            }
        }
        Ok(())
    }

    /// 解析输出路径
    pub fn paths(&self) -> ResolvedPaths {
        let output_root = PathBuf::from(&self.output_root);
        ResolvedPaths {
            input_root: PathBuf::from(&self.input_root),
            json_dir: output_root.join(&self.json_subdir),
            chunks_dir: output_root.join(&self.chunks_subdir),
            manifest_path: output_root.join(&self.manifest_filename),
            report_path: output_root.join(&self.report_filename),
            output_root,
        }
    }
}

/// 配置文件结构（全部字段可选，缺省沿用默认值）
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    paths: PathsSection,
    concurrency: ConcurrencySection,
    run: RunSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathsSection {
    input_root: Option<String>,
    output_root: Option<String>,
    json_subdir: Option<String>,
    chunks_subdir: Option<String>,
    manifest_filename: Option<String>,
    report_filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConcurrencySection {
    max_workers: Option<usize>,
    doc_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunSection {
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl SettingsFile {
    fn apply(self, config: &mut Config) {
        let SettingsFile {
            paths,
            concurrency,
            run,
        } = self;

        overwrite(&mut config.input_root, paths.input_root);
        overwrite(&mut config.output_root, paths.output_root);
        overwrite(&mut config.json_subdir, paths.json_subdir);
        overwrite(&mut config.chunks_subdir, paths.chunks_subdir);
        overwrite(&mut config.manifest_filename, paths.manifest_filename);
        overwrite(&mut config.report_filename, paths.report_filename);
        overwrite(&mut config.max_concurrent_docs, concurrency.max_workers);
        overwrite(&mut config.doc_timeout_secs, concurrency.doc_timeout_secs);
        overwrite(&mut config.verbose_logging, run.verbose_logging);
        overwrite(&mut config.output_log_file, run.output_log_file);
    }
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn read_toml_table(path: &Path) -> AppResult<toml::Table> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let table: toml::Table = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
        path: path.display().to_string(),
        source,
    })?;
    Ok(table)
}

/// 递归合并：表与表合并，其他值直接覆盖
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn resolve_against(base: &Path, value: &str) -> String {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        value.to_string()
    } else {
        base.join(candidate).display().to_string()
    }
}
