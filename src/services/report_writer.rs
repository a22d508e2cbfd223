//! 运行报告写入服务 - 业务能力层
//!
//! 只负责"写 report.json 与错误日志行"能力，不关心流程

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::error::Finding;
use crate::utils::logging::append_log_line;

/// 单篇文档的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    /// 文档编号；无法从文件名识别时为文件名本身
    pub id: String,
    /// 源文件名
    pub source: String,
    pub accepted: bool,
    pub findings: Vec<Finding>,
}

impl DocumentOutcome {
    pub fn fatal_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_fatal())
    }
}

/// 整批运行报告
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub generated_at: String,
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub outcomes: Vec<DocumentOutcome>,
}

impl RunReport {
    /// 汇总结果（到达顺序无关，按编号排序）
    pub fn from_outcomes(mut outcomes: Vec<DocumentOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.source.cmp(&b.source)));
        let accepted = outcomes.iter().filter(|o| o.accepted).count();
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            total: outcomes.len(),
            accepted,
            rejected: outcomes.len() - accepted,
            outcomes,
        }
    }
}

/// 报告写入服务
///
/// 职责：
/// - 将整批结果写入 report.json
/// - 将被拒绝的文档逐行追加到运行日志
pub struct ReportWriter {
    report_path: PathBuf,
    log_path: PathBuf,
}

impl ReportWriter {
    pub fn new(report_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: report_path.into(),
            log_path: log_path.into(),
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// 记录一篇被拒绝的文档（一行）
    pub fn log_rejected(&self, outcome: &DocumentOutcome) -> Result<()> {
        let reasons = outcome
            .fatal_findings()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        let line = format!("文档 {} | 源文件 {} | 拒绝: {}", outcome.id, outcome.source, reasons);
        debug!("写入错误日志: {}", line);
        append_log_line(&self.log_path.to_string_lossy(), &line)
    }

    /// 写入整批报告
    pub async fn write_report(&self, report: &RunReport) -> Result<()> {
        if let Some(parent) = self.report_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("创建报告目录失败: {}", parent.display()))?;
            }
        }

        let mut json = serde_json::to_string_pretty(report).context("序列化运行报告失败")?;
        json.push('\n');
        tokio::fs::write(&self.report_path, json)
            .await
            .with_context(|| format!("写入报告失败: {}", self.report_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FindingCategory;

    fn outcome(id: &str, accepted: bool) -> DocumentOutcome {
        DocumentOutcome {
            id: id.to_string(),
            source: format!("{}.html", id),
            accepted,
            findings: if accepted {
                Vec::new()
            } else {
                vec![Finding::fatal(FindingCategory::Binding, Some(3), "答案表中没有该题的答案")]
            },
        }
    }

    #[test]
    fn test_report_sorts_by_id_regardless_of_arrival() {
        let report = RunReport::from_outcomes(vec![
            outcome("e003", true),
            outcome("e001", false),
            outcome("e002", true),
        ]);
        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["e001", "e002", "e003"]);
        assert_eq!(report.total, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 1);
    }

    #[tokio::test]
    async fn test_write_report_and_rejection_log() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("out/report.json"), dir.path().join("ingest.log"));

        let rejected = outcome("e001", false);
        writer.log_rejected(&rejected).unwrap();
        writer
            .write_report(&RunReport::from_outcomes(vec![rejected]))
            .await
            .unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(writer.report_path()).unwrap()).unwrap();
        assert_eq!(report["rejected"], 1);
        assert_eq!(report["outcomes"][0]["findings"][0]["category"], "binding");
        assert!(report["generatedAt"].is_string());

        let log = std::fs::read_to_string(dir.path().join("ingest.log")).unwrap();
        assert!(log.contains("文档 e001"));
        assert_eq!(log.lines().count(), 1);
    }
}
