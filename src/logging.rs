// ==========================================
// 日志系统初始化
// ==========================================
// tracing + tracing-subscriber，级别由 RUST_LOG 控制
// 标准输出留给命令结果（JSON），日志一律写 stderr
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤规则
///
/// 本 crate 记录每次称重动作（info）；SQLite 驱动只报告告警
const DEFAULT_DIRECTIVES: &str = "info,rusqlite=warn";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 初始化文本日志（磅房终端）
///
/// # 环境变量
/// - RUST_LOG: 例如 `RUST_LOG=truck_weighbridge=debug` 可查看仪表原始读数
pub fn init() {
    fmt()
        .with_env_filter(env_filter(DEFAULT_DIRECTIVES))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化 JSON 日志（工控机日志采集）
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter(DEFAULT_DIRECTIVES))
        .with_writer(std::io::stderr)
        .with_current_span(false)
        .init();
}

/// 测试日志: debug 级别，输出交给测试框架捕获；重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("debug,rusqlite=warn"))
        .with_test_writer()
        .try_init();
}
