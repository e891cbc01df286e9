//! 批量大纲处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 LLM 客户端、存储和备考服务
//! 2. **批量加载**：扫描大纲目录下的 `.txt` / `.pdf` 文件
//! 3. **并发控制**：使用 Semaphore 限制同时处理的大纲数量
//! 4. **报告输出**：每份大纲追加一行 JSON 报告
//! 5. **全局统计**：汇总所有大纲的处理结果

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::{DocumentKind, MemoryStore};
use crate::orchestrator::exam_service::ExamService;
use crate::orchestrator::report_writer::{ReportWriter, SyllabusReport};
use crate::services::LlmService;
use crate::utils::logging::{log_startup, log_syllabi_loaded, log_syllabus_summary, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    service: Arc<ExamService>,
    report_writer: Arc<ReportWriter>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，后端调用将会失败，流程会以兜底结果完成");
        }
        log_startup(&config.llm_model_name, config.max_concurrent_syllabi);

        let model = Arc::new(LlmService::new(&config));
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(ExamService::new(&config, model, store));
        let report_writer = Arc::new(ReportWriter::with_path(&config.report_file));

        Ok(Self {
            config,
            service,
            report_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let files = scan_syllabi(&self.config.syllabus_folder)?;

        if files.is_empty() {
            warn!("⚠️ 没有找到待处理的大纲文件，程序结束");
            return Ok(());
        }

        log_syllabi_loaded(files.len(), &self.config.syllabus_folder);

        let stats = self.process_all(files).await?;
        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            self.report_writer.path(),
        );

        Ok(())
    }

    async fn process_all(&self, files: Vec<PathBuf>) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_syllabi.max(1)));
        let mut stats = ProcessingStats {
            total: files.len(),
            ..Default::default()
        };

        let mut handles = Vec::new();
        for (idx, path) in files.into_iter().enumerate() {
            let index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let service = self.service.clone();
            let report_writer = self.report_writer.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match process_syllabus(&service, &report_writer, &path, index).await {
                    Ok(success) => success,
                    Err(e) => {
                        error!("[大纲 {}] ❌ 处理过程中发生错误: {:#}", index, e);
                        false
                    }
                }
            });
            handles.push((index, handle));
        }

        for (index, handle) in handles {
            match handle.await {
                Ok(true) => stats.success += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("[大纲 {}] 任务执行失败: {}", index, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// 上传 → 生成 → 写报告；返回是否得到了非空测验
async fn process_syllabus(
    service: &ExamService,
    report_writer: &ReportWriter,
    path: &Path,
    index: usize,
) -> Result<bool> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("读取大纲文件失败: {}", path.display()))?;

    let upload = service.upload_syllabus(&filename, &bytes).await?;
    let prepared = service.prepare_exam(upload.syllabus_id).await?;

    let report = SyllabusReport::from_state(&filename, &prepared.state);
    report_writer.write(&report).await?;

    log_syllabus_summary(
        index,
        &filename,
        prepared.state.topics.len(),
        prepared.mcqs_saved,
        prepared.quiz_size(),
        prepared.state.errors.len(),
    );

    Ok(report.is_success())
}

/// 列出目录下支持的大纲文件（按文件名排序）
pub fn scan_syllabi(folder: &str) -> Result<Vec<PathBuf>> {
    info!("\n📁 正在扫描大纲目录: {}", folder);
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .with_context(|| format!("无法读取大纲目录: {}", folder))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| DocumentKind::from_filename(n).is_ok())
        })
        .collect();
    files.sort();
    Ok(files)
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    success: usize,
    failed: usize,
    total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_keeps_supported_files_sorted() {
        let dir = std::env::temp_dir().join(format!("exam_prep_scan_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.txt", "a.PDF", "c.docx", "notes.md"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let files = scan_syllabi(dir.to_str().unwrap()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.txt"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_missing_folder_is_error() {
        assert!(scan_syllabi("/definitely/not/here").is_err());
    }
}
