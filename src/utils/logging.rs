//! 日志工具模块
//!
//! 订阅器初始化和批处理各阶段的日志格式

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志订阅器；`RUST_LOG` 优先，否则按 verbose 选择级别
///
/// 重复初始化（例如测试中）会被忽略
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 记录程序启动信息
pub fn log_startup(model_name: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 备考题目生成模式");
    info!("🤖 模型: {}", model_name);
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

pub fn log_syllabi_loaded(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 份大纲", folder, total);
}

/// 记录单份大纲的处理结果
///
/// # 参数
/// - `index`: 大纲编号（从 1 开始）
/// - `title`: 大纲文件名
/// - `topics`: 提取到的主题数
/// - `mcqs`: 写入存储的题目数
/// - `quiz`: 测验题数
/// - `errors`: 流程中记录的错误数
pub fn log_syllabus_summary(
    index: usize,
    title: &str,
    topics: usize,
    mcqs: usize,
    quiz: usize,
    errors: usize,
) {
    info!("\n{}", "─".repeat(60));
    info!("[大纲 {}] {}", index, title);
    info!("主题: {} | 题目: {} | 测验: {} | 错误: {}", topics, mcqs, quiz, errors);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 得到非空测验的大纲数
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `report_file`: 报告文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, report_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_file);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
