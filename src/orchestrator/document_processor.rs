//! 单篇文档处理器 - 编排层
//!
//! 负责一篇文档从读入到落盘的全过程：
//! - 从文件名推断编号与难度
//! - 读取源文件（只读一次）
//! - 在阻塞线程池里运行 DocumentFlow
//! - 原子写出 `<json_dir>/<id>.json`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::ResolvedPaths;
use crate::error::{Finding, FindingCategory};
use crate::models::{infer_identity, read_source, SourceFile};
use crate::services::DocumentOutcome;
use crate::workflow::{DocCtx, DocumentFlow};

/// 输出文件路径
pub fn output_path(json_dir: &Path, document_id: &str) -> PathBuf {
    json_dir.join(format!("{}.json", document_id))
}

/// 写入过程中使用的临时文件路径
pub fn temp_path(json_dir: &Path, document_id: &str) -> PathBuf {
    json_dir.join(format!("{}.json.tmp", document_id))
}

/// 处理单篇文档
///
/// 任何失败都体现在返回的结果里，不向上传播
pub async fn process_document(
    source: SourceFile,
    task_index: usize,
    paths: Arc<ResolvedPaths>,
    flow: Arc<DocumentFlow>,
) -> DocumentOutcome {
    let identity = match infer_identity(&source.name) {
        Ok(identity) => identity,
        Err(e) => {
            error!("[任务 {}] ❌ {}: {}", task_index, source.name, e);
            return rejected(source.name.clone(), source.name, vec![e.into()]);
        }
    };

    let ctx = DocCtx::new(identity.document_id(), source.name.clone(), task_index);
    info!("{} 📄 开始处理: {}", ctx, ctx.source_name);

    let markup = match read_source(&source).await {
        Ok(markup) => markup,
        Err(e) => {
            error!("{} ❌ 读取失败: {:#}", ctx, e);
            return rejected(
                ctx.document_id,
                ctx.source_name,
                vec![runtime(format!("读取源文件失败: {:#}", e))],
            );
        }
    };

    let flow_ctx = ctx.clone();
    let joined =
        tokio::task::spawn_blocking(move || flow.run(&markup, identity, &flow_ctx)).await;

    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{} ❌ 处理任务异常退出: {}", ctx, e);
            return rejected(
                ctx.document_id,
                ctx.source_name,
                vec![runtime(format!("处理任务异常退出: {}", e))],
            );
        }
    };

    let mut findings = outcome.findings;
    let Some(rendered) = outcome.output else {
        info!("{} ❌ 文档被拒绝，未写出任何文件", ctx);
        return rejected(ctx.document_id, ctx.source_name, findings);
    };

    if let Err(e) = write_atomically(&paths.json_dir, &ctx.document_id, &rendered.json).await {
        error!("{} ❌ 写出失败: {:#}", ctx, e);
        findings.push(runtime(format!("写出失败: {:#}", e)));
        return rejected(ctx.document_id, ctx.source_name, findings);
    }

    info!(
        "{} ✅ 已写出 {}",
        ctx,
        output_path(&paths.json_dir, &ctx.document_id).display()
    );
    DocumentOutcome {
        id: ctx.document_id,
        source: ctx.source_name,
        accepted: true,
        findings,
    }
}

/// 先写临时文件再改名，读者永远看不到半截的输出
async fn write_atomically(json_dir: &Path, document_id: &str, json: &str) -> Result<()> {
    tokio::fs::create_dir_all(json_dir)
        .await
        .with_context(|| format!("创建输出目录失败: {}", json_dir.display()))?;

    let tmp = temp_path(json_dir, document_id);
    let target = output_path(json_dir, document_id);

    if let Err(e) = tokio::fs::write(&tmp, json).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("写入临时文件失败: {}", tmp.display()));
    }
    if let Err(e) = tokio::fs::rename(&tmp, &target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("重命名失败: {}", target.display()));
    }
    Ok(())
}

fn runtime(message: String) -> Finding {
    Finding::fatal(FindingCategory::Runtime, None, message)
}

fn rejected(id: String, source: String, findings: Vec<Finding>) -> DocumentOutcome {
    DocumentOutcome {
        id,
        source,
        accepted: false,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let dir = Path::new("out/json");
        assert_eq!(output_path(dir, "e009"), PathBuf::from("out/json/e009.json"));
        assert_eq!(temp_path(dir, "e009"), PathBuf::from("out/json/e009.json.tmp"));
    }

    #[tokio::test]
    async fn test_write_atomically_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let json_dir = dir.path().join("json");
        write_atomically(&json_dir, "e001", "{}\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(json_dir.join("e001.json")).unwrap(), "{}\n");
        assert!(!json_dir.join("e001.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unrecognised_file_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.html");
        std::fs::write(&path, "<html></html>").unwrap();

        let config = crate::config::Config {
            output_root: dir.path().join("out").to_string_lossy().to_string(),
            ..Default::default()
        };
        let outcome = process_document(
            SourceFile {
                path,
                name: "notes.html".to_string(),
            },
            1,
            Arc::new(config.paths()),
            Arc::new(DocumentFlow::default()),
        )
        .await;

        assert!(!outcome.accepted);
        assert_eq!(outcome.id, "notes.html");
        assert!(outcome.fatal_findings().count() >= 1);
        assert!(!dir.path().join("out").exists());
    }
}
