//! 文档处理流程 - 流程层
//!
//! 核心职责：定义"一篇文档"的完整处理流程
//!
//! 流程顺序（严格串行，任一阶段致命失败即停止）：
//! 1. 规整 → 答案表 / 文章 / 题组
//! 2. 题型识别 → 字段提取
//! 3. 答案绑定 → 题号校验
//! 4. 组装 → 校验 → 往返校验
//!
//! 整个流程是同步的：`scraper::Html` 不能跨线程，调用方应放在阻塞线程池里执行。

use tracing::{debug, error, info, warn};

use crate::error::{Finding, FindingCategory};
use crate::infrastructure::ExamPage;
use crate::models::{ExamDocument, SourceIdentity};
use crate::services::{
    answer_binder, answer_table, auditor, document_assembler, field_extractor, group_walker,
    numbering_resolver, passage_extractor, type_classifier, validator,
};
use crate::utils::logging::truncate_text;
use crate::workflow::doc_ctx::DocCtx;

/// 已通过全部校验、可以落盘的文档
#[derive(Debug, Clone)]
pub struct Rendered {
    pub document: ExamDocument,
    /// 序列化后的输出文本（以换行结尾）
    pub json: String,
}

/// 单篇文档的流程结果
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    /// 全部发现（警告与致命）
    pub findings: Vec<Finding>,
    /// 被接受时的输出；被拒绝时为 None
    pub output: Option<Rendered>,
}

impl FlowOutcome {
    pub fn accepted(&self) -> bool {
        self.output.is_some()
    }
}

/// 文档处理流程
///
/// - 编排单篇文档的全部阶段
/// - 不持有任何跨文档状态
/// - 不做任何 I/O
#[derive(Debug, Clone, Default)]
pub struct DocumentFlow {
    verbose_logging: bool,
}

impl DocumentFlow {
    pub fn new(verbose_logging: bool) -> Self {
        Self { verbose_logging }
    }

    /// 运行完整流程
    pub fn run(&self, markup: &str, identity: SourceIdentity, ctx: &DocCtx) -> FlowOutcome {
        let mut findings = Vec::new();
        let output = match self.run_stages(markup, identity, ctx, &mut findings) {
            Ok(output) => output,
            Err(fatal) => {
                findings.push(fatal);
                None
            }
        };

        for finding in &findings {
            if finding.is_fatal() {
                error!("{} ❌ {}", ctx, finding);
            } else {
                warn!("{} ⚠️ {}", ctx, finding);
            }
        }

        FlowOutcome { findings, output }
    }

    /// `Ok(None)` 表示校验阶段发现致命问题（已记录在 findings 中）
    fn run_stages(
        &self,
        markup: &str,
        identity: SourceIdentity,
        ctx: &DocCtx,
        findings: &mut Vec<Finding>,
    ) -> Result<Option<Rendered>, Finding> {
        let page = ExamPage::parse(markup);

        // ========== 阶段 1: 三路提取 ==========
        let table = answer_table::extract(&page, findings)?;
        let passage = passage_extractor::extract(&page)?;
        let groups = group_walker::walk(&page, &passage.heading_targets)?;
        debug!(
            "{} 答案 {} 条, 段落 {} 个, 题组 {} 个",
            ctx,
            table.len(),
            passage.passage.paragraphs.len(),
            groups.len()
        );

        // ========== 阶段 2: 识别题型并提取字段 ==========
        let mut drafts = Vec::new();
        for group in &groups {
            if group.nodes.is_empty() {
                findings.push(Finding::warning(
                    FindingCategory::Content,
                    None,
                    format!("第 {} 组没有任何题目节点", group.index),
                ));
                continue;
            }
            for node in &group.nodes {
                let kind = type_classifier::classify(node, group)?;
                if self.verbose_logging {
                    info!(
                        "{} {:?} → {} | {}",
                        ctx,
                        node.numbers,
                        kind.code(),
                        truncate_text(&node.prompt, 40)
                    );
                }
                drafts.push(field_extractor::extract(node, group, kind, findings)?);
            }
        }

        // ========== 阶段 3: 绑定答案并定号 ==========
        let bound = answer_binder::bind(drafts, &table, findings)?;
        let questions = numbering_resolver::resolve(bound, identity.difficulty, findings)?;

        // ========== 阶段 4: 组装与校验 ==========
        let document = document_assembler::assemble(
            identity.document_id(),
            identity.difficulty,
            passage.passage,
            questions,
        );

        let validation = validator::validate(&document);
        let rejected = validator::has_fatal(&validation);
        findings.extend(validation);
        if rejected {
            return Ok(None);
        }

        let json = auditor::render_checked(&document)?;
        info!(
            "{} ✓ 组装完成: {} 道题, 题型 {:?}",
            ctx,
            document.metadata.total_questions,
            document
                .metadata
                .question_types
                .iter()
                .map(|t| t.code())
                .collect::<Vec<_>>()
        );
        Ok(Some(Rendered { document, json }))
    }
}
