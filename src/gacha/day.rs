use chrono::{DateTime, Utc};

/// 每日免费抽的日期键格式（ISO 日历日期）
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// 计算 `now` 所在的 UTC 日历日，例如 `2025-09-01`。
///
/// 每日边界固定为 UTC 零点，与用户所在时区无关。
pub fn day_key(now: DateTime<Utc>) -> String {
    now.date_naive().format(DAY_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_key_format() {
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).unwrap();
        assert_eq!(day_key(now), "2025-09-01");
    }

    #[test]
    fn test_day_key_rolls_over_at_utc_midnight() {
        let before = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(day_key(before), "2025-12-31");
        assert_eq!(day_key(after), "2026-01-01");
    }
}
