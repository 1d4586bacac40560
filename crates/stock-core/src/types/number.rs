//! 증권사/재무 응답의 숫자 문자열 파싱.

use rust_decimal::Decimal;
use std::str::FromStr;

/// 부호가 붙은 숫자 문자열을 파싱합니다 (`"+600"`, `"-1,000"`, `"3,022,314"`).
///
/// 쉼표와 앞의 `+` 기호는 제거하고 `-` 기호는 유지합니다.
/// 비어 있거나 해석할 수 없는 값은 0으로 취급합니다.
pub fn parse_signed_number(value: &str) -> Decimal {
    parse_optional_number(value).unwrap_or(Decimal::ZERO)
}

/// 숫자 문자열을 파싱하되 값이 없으면 `None`을 반환합니다.
///
/// `"-"` 단독 값은 재무제표에서 "해당 없음"을 뜻하므로 `None`입니다.
pub fn parse_optional_number(value: &str) -> Option<Decimal> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}
