// ==========================================
// 地磅称重系统 - 仪表 ASCII 帧解析
// ==========================================
// 常见输出: "ST,GS,+005000kg" / "US,GS,+004980kg" / "  12.34 t"
// 规则: 取第一个带符号十进制数；单位 t 换算为 kg；US 开头视为不稳定
// ==========================================

use crate::scale::error::{ScaleError, ScaleResult};

/// 解析一帧读数，返回 KG
pub fn parse_weight_frame(raw: &str) -> ScaleResult<f64> {
    let frame = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{2}' || c == '\u{3}');
    if frame.to_ascii_uppercase().starts_with("US") {
        return Err(ScaleError::Unstable {
            frame: frame.to_string(),
        });
    }

    let invalid = || ScaleError::InvalidFrame {
        frame: frame.to_string(),
    };

    let bytes = frame.as_bytes();
    let start = bytes
        .iter()
        .position(|b| b.is_ascii_digit())
        .ok_or_else(invalid)?;
    // 数字前紧邻的符号
    let start = match start.checked_sub(1).map(|i| bytes[i]) {
        Some(b'+') | Some(b'-') => start - 1,
        _ => start,
    };
    let end = bytes[start + 1..]
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b'.'))
        .map(|p| start + 1 + p)
        .unwrap_or(bytes.len());

    let value: f64 = frame[start..end].parse().map_err(|_| invalid())?;

    let unit = frame[end..].trim_start().to_ascii_lowercase();
    let kg = if unit.starts_with("kg") {
        value
    } else if unit.starts_with('t') {
        value * 1000.0
    } else {
        value
    };
    Ok(kg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stable_kg_frame() {
        assert_eq!(parse_weight_frame("ST,GS,+005000kg\r\n").unwrap(), 5000.0);
        assert_eq!(parse_weight_frame("ST,NT,-000020kg").unwrap(), -20.0);
    }

    #[test]
    fn test_parse_tonnes_and_bare_numbers() {
        assert_eq!(parse_weight_frame("  12.5 t").unwrap(), 12500.0);
        assert_eq!(parse_weight_frame("\u{2}2000\u{3}").unwrap(), 2000.0);
    }

    #[test]
    fn test_unstable_and_invalid_frames() {
        assert!(matches!(
            parse_weight_frame("US,GS,+004980kg"),
            Err(ScaleError::Unstable { .. })
        ));
        assert!(matches!(
            parse_weight_frame("ST,GS,OL"),
            Err(ScaleError::InvalidFrame { .. })
        ));
        assert!(matches!(parse_weight_frame(""), Err(ScaleError::InvalidFrame { .. })));
    }
}
