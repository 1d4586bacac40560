//! `YYYYMMDD` 날짜 문자열 변환.
//!
//! 증권사 API와 재무 데이터는 날짜를 `20250908` 형식으로 주고받습니다.

use chrono::{Duration, NaiveDate};

const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

/// `YYYYMMDD` 문자열을 날짜로 변환합니다.
///
/// 공백은 무시하며, 빈 문자열이나 잘못된 날짜는 `None`을 반환합니다.
pub fn parse_compact_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, COMPACT_DATE_FORMAT).ok()
}

/// 날짜를 `YYYYMMDD` 문자열로 변환합니다.
pub fn format_compact_date(date: NaiveDate) -> String {
    date.format(COMPACT_DATE_FORMAT).to_string()
}

/// 기준일에서 `days`일 전 날짜 (롤링 컷오프 계산용).
pub fn days_before(base: NaiveDate, days: u32) -> NaiveDate {
    base - Duration::days(i64::from(days))
}
