//! 通用工具函数

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalize a hardware "old number" for lookups.
///
/// Hardware numbers are human-assigned and arrive from forms and spreadsheet
/// imports with inconsistent case and stray whitespace. All allocation and
/// stock lookups key on the normalized form.
pub fn normalize_hardware_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hardware_number() {
        assert_eq!(normalize_hardware_number("  h1-204 "), "H1-204");
        assert_eq!(normalize_hardware_number("H1-204"), "H1-204");
        assert_eq!(normalize_hardware_number("\tabc\n"), "ABC");
    }
}
