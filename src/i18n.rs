// ==========================================
// 国际化 (i18n)
// ==========================================
// rust-i18n，词条在 locales/*.yml；i18n! 宏在 lib.rs 中初始化
// 磅房提示、单据核对记录、导入结果均经此处翻译
// ==========================================

/// 支持的界面语言，首项为默认
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en"];

/// 规范化语言代码: zh / zh_CN / zh-Hans → zh-CN，en-US / en_GB → en
///
/// 不支持的语言返回 None
pub fn normalize_locale(raw: &str) -> Option<&'static str> {
    let code = raw.trim().replace('_', "-").to_ascii_lowercase();
    if code == "zh" || code.starts_with("zh-") {
        Some("zh-CN")
    } else if code == "en" || code.starts_with("en-") {
        Some("en")
    } else {
        None
    }
}

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言；不支持的代码保持当前语言不变
pub fn set_locale(locale: &str) {
    match normalize_locale(locale) {
        Some(code) => rust_i18n::set_locale(code),
        None => tracing::warn!(locale = %locale, supported = ?SUPPORTED_LOCALES, "不支持的语言"),
    }
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译并替换 `%{name}` 占位符
///
/// ```no_run
/// use truck_weighbridge::i18n::t_with_args;
/// let msg = t_with_args("weighing.gross_set", &[("weight", "5000")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(rust_i18n::t!(key).to_string(), |text, (name, value)| {
            text.replace(&format!("%{{{}}}", name), value)
        })
}

/// 重量显示格式: 整数不带小数，否则保留最多 3 位小数
pub fn format_kg(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.3}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
