use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::fs;

use crate::error::{PipelineError, PipelineResult};
use crate::models::Difficulty;

/// 文档编号允许的序号范围
const DOCUMENT_NUMBERS: std::ops::RangeInclusive<u32> = 1..=150;

static SOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.\s*(P[123])").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});

/// 待处理的源文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// 文件名（不含目录）
    pub name: String,
}

/// 从文件名得到的文档身份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceIdentity {
    pub number: u32,
    pub difficulty: Difficulty,
}

impl SourceIdentity {
    /// `e` + 三位序号
    pub fn document_id(&self) -> String {
        format!("e{:03}", self.number)
    }
}

/// 从 "<n>. P<d> - <标题>.html" 形式的文件名推断编号与难度
pub fn infer_identity(file_name: &str) -> PipelineResult<SourceIdentity> {
    let caps = SOURCE_NAME.captures(file_name).ok_or_else(|| {
        PipelineError::extraction(
            None,
            "id",
            format!("文件名 {:?} 不符合 \"<序号>. P<难度> - <标题>\" 格式", file_name),
        )
    })?;

    let number: u32 = caps[1].parse().map_err(|_| {
        PipelineError::extraction(None, "id", format!("文件名中的序号 {} 无法解析", &caps[1]))
    })?;
    if !DOCUMENT_NUMBERS.contains(&number) {
        return Err(PipelineError::extraction(
            None,
            "id",
            format!("序号 {} 超出 1-150", number),
        ));
    }

    let difficulty = Difficulty::from_tag(&caps[2]).ok_or_else(|| {
        PipelineError::extraction(None, "metadata.difficulty", format!("无法识别难度 {}", &caps[2]))
    })?;

    Ok(SourceIdentity { number, difficulty })
}

/// 列出目录下所有 .html / .htm 文件（按文件名排序）
pub async fn discover_sources(folder: &Path) -> Result<Vec<SourceFile>> {
    if !fs::try_exists(folder).await.unwrap_or(false) {
        anyhow::bail!("文件夹不存在: {}", folder.display());
    }

    let mut sources = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_html = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
        if !is_html {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        sources.push(SourceFile { path, name });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}

/// 读取源文件全文（每篇文档只读一次）
pub async fn read_source(source: &SourceFile) -> Result<String> {
    let bytes = fs::read(&source.path)
        .await
        .with_context(|| format!("无法读取源文件: {}", source.path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_identity() {
        let identity = infer_identity("42. P2 - The Life of Bees.html").unwrap();
        assert_eq!(identity.document_id(), "e042");
        assert_eq!(identity.difficulty, Difficulty::P2);

        assert_eq!(infer_identity("7.P1-Coral.html").unwrap().document_id(), "e007");
    }

    #[test]
    fn test_infer_identity_rejects_bad_names() {
        assert!(infer_identity("Bees.html").is_err());
        assert!(infer_identity("151. P3 - Too Far.html").is_err());
        assert!(infer_identity("0. P1 - Zero.html").is_err());
    }

    #[tokio::test]
    async fn test_discover_sources_sorted_html_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2. P1 - B.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("1. P1 - A.html"), "\u{feff}<html></html>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let sources = discover_sources(dir.path()).await.unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["1. P1 - A.html", "2. P1 - B.html"]);

        let text = read_source(&sources[0]).await.unwrap();
        assert_eq!(text, "<html></html>");
    }

    #[test]
    fn test_missing_folder_is_error() {
        let result = tokio_test::block_on(discover_sources(Path::new("/definitely/not/here")));
        assert!(result.is_err());
    }
}
