//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次批量转换的调度和汇总。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、解析输出路径、创建 DocumentFlow
//! 2. **批量加载**：扫描输入目录下的所有 HTML 文档
//! 3. **并发控制**：使用 Semaphore 限制同时处理的文档数量
//! 4. **超时控制**：单篇文档超时即判为拒绝，不影响其他文档
//! 5. **全局汇总**：收集所有文档的结果，写出 report.json
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单篇文档的细节
//! - **互不影响**：任何一篇文档的失败都不会中断整批
//! - **向下委托**：委托 document_processor 处理单篇文档

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::config::{Config, ResolvedPaths};
use crate::error::{Finding, FindingCategory};
use crate::models::{discover_sources, infer_identity, SourceFile};
use crate::orchestrator::document_processor::{self, output_path, temp_path};
use crate::services::{DocumentOutcome, ReportWriter, RunReport};
use crate::utils::logging::{init_log_file, log_sources_loaded, log_startup, print_final_stats};
use crate::workflow::DocumentFlow;

/// 应用主结构
pub struct App {
    config: Config,
    paths: Arc<ResolvedPaths>,
    flow: Arc<DocumentFlow>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(config.max_concurrent_docs, &config.input_root);

        let paths = Arc::new(config.paths());
        let flow = Arc::new(DocumentFlow::new(config.verbose_logging));

        Ok(Self {
            config,
            paths,
            flow,
        })
    }

    /// 运行应用主逻辑，返回整批报告
    pub async fn run(&self) -> Result<RunReport> {
        info!("\n📁 正在扫描待处理的文档...");
        let sources = discover_sources(&self.paths.input_root).await?;

        if sources.is_empty() {
            warn!("⚠️ 没有找到待处理的 HTML 文件");
        } else {
            log_sources_loaded(sources.len(), self.config.max_concurrent_docs);
        }

        let (sources, duplicates) = reject_duplicate_ids(sources);
        let mut outcomes = self.process_all(sources).await;
        outcomes.extend(duplicates);

        let writer = ReportWriter::new(&self.paths.report_path, &self.config.output_log_file);
        for outcome in outcomes.iter().filter(|o| !o.accepted) {
            if let Err(e) = writer.log_rejected(outcome) {
                error!("写入错误日志失败: {}", e);
            }
        }

        let report = RunReport::from_outcomes(outcomes);
        writer.write_report(&report).await?;

        print_final_stats(
            report.accepted,
            report.rejected,
            report.total,
            &writer.report_path().display().to_string(),
        );
        Ok(report)
    }

    /// 并发处理所有文档，结果按到达顺序收集
    async fn process_all(&self, sources: Vec<SourceFile>) -> Vec<DocumentOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_docs.max(1)));
        let timeout = match self.config.doc_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let (tx, mut rx) = mpsc::channel::<DocumentOutcome>(sources.len().max(1));
        let mut handles = Vec::new();

        for (idx, source) in sources.into_iter().enumerate() {
            let task_index = idx + 1;
            let semaphore = semaphore.clone();
            let paths = self.paths.clone();
            let flow = self.flow.clone();
            let tx = tx.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let outcome = run_with_timeout(source, task_index, paths, flow, timeout).await;
                if tx.send(outcome).await.is_err() {
                    error!("[任务 {}] 结果通道已关闭", task_index);
                }
            });
            handles.push((task_index, handle));
        }
        drop(tx);

        let mut outcomes = Vec::new();
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        let (indices, handles): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
        for (task_index, joined) in indices.into_iter().zip(join_all(handles).await) {
            if let Err(e) = joined {
                error!("[任务 {}] 任务执行失败: {}", task_index, e);
                outcomes.push(DocumentOutcome {
                    id: format!("task-{}", task_index),
                    source: String::new(),
                    accepted: false,
                    findings: vec![Finding::fatal(
                        FindingCategory::Runtime,
                        None,
                        format!("任务执行失败: {}", e),
                    )],
                });
            }
        }

        outcomes
    }
}

/// 同一编号只处理排序后的第一个源文件，其余直接拒绝
///
/// 每篇文档独占自己的输出路径，重复编号会互相覆盖
fn reject_duplicate_ids(sources: Vec<SourceFile>) -> (Vec<SourceFile>, Vec<DocumentOutcome>) {
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut unique = Vec::with_capacity(sources.len());
    let mut rejected = Vec::new();

    for source in sources {
        let Ok(identity) = infer_identity(&source.name) else {
            unique.push(source);
            continue;
        };
        let id = identity.document_id();
        match owners.get(&id) {
            Some(owner) => {
                error!("[文档 {}] ❌ 编号与 {} 重复: {}", id, owner, source.name);
                rejected.push(DocumentOutcome {
                    findings: vec![Finding::fatal(
                        FindingCategory::Structural,
                        None,
                        format!("文档编号 {} 已被 {} 使用", id, owner),
                    )],
                    id,
                    source: source.name,
                    accepted: false,
                });
            }
            None => {
                owners.insert(id, source.name.clone());
                unique.push(source);
            }
        }
    }

    (unique, rejected)
}

/// 在超时限制内处理一篇文档；超时视为拒绝并清理可能残留的输出
async fn run_with_timeout(
    source: SourceFile,
    task_index: usize,
    paths: Arc<ResolvedPaths>,
    flow: Arc<DocumentFlow>,
    timeout: Option<Duration>,
) -> DocumentOutcome {
    let Some(limit) = timeout else {
        return document_processor::process_document(source, task_index, paths, flow).await;
    };

    let id = infer_identity(&source.name)
        .map(|identity| identity.document_id())
        .unwrap_or_else(|_| source.name.clone());
    let name = source.name.clone();

    match tokio::time::timeout(
        limit,
        document_processor::process_document(source, task_index, paths.clone(), flow),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            error!("[文档 {}] ⏱️ 处理超时（{} 秒）", id, limit.as_secs());
            let _ = tokio::fs::remove_file(temp_path(&paths.json_dir, &id)).await;
            let _ = tokio::fs::remove_file(output_path(&paths.json_dir, &id)).await;
            DocumentOutcome {
                id,
                source: name,
                accepted: false,
                findings: vec![Finding::fatal(
                    FindingCategory::Runtime,
                    None,
                    format!("处理超时（{} 秒）", limit.as_secs()),
                )],
            }
        }
    }
}
