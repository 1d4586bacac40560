//! 수집 대상 종목 결정.

use std::collections::HashSet;
use stock_data::{Database, StockRepository};
use tracing::{info, warn};

use crate::Result;

/// `--code` 인자를 파싱합니다.
///
/// 비어 있거나 `all`이면 `None`(활성 종목 전체), 그 외에는 쉼표로 구분된 코드 목록입니다.
pub fn parse_code_list(arg: Option<&str>) -> Option<Vec<String>> {
    let arg = arg.map(str::trim).filter(|s| !s.is_empty())?;
    if arg.eq_ignore_ascii_case("all") {
        return None;
    }

    let mut seen = HashSet::new();
    let codes = arg
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .map(str::to_string)
        .collect();
    Some(codes)
}

/// 수집 대상 종목코드 목록을 결정합니다.
pub async fn resolve_stock_codes(db: &Database, code_arg: Option<&str>) -> Result<Vec<String>> {
    match parse_code_list(code_arg) {
        Some(codes) => {
            let known: HashSet<String> = StockRepository::new(db.clone())
                .find_by_codes(&codes)
                .await?
                .into_iter()
                .map(|s| s.code)
                .collect();
            let (found, unknown): (Vec<String>, Vec<String>) =
                codes.into_iter().partition(|code| known.contains(code));
            if !unknown.is_empty() {
                warn!(codes = ?unknown, "종목 마스터에 없는 코드는 건너뜁니다");
            }
            info!(count = found.len(), "특정 종목 수집");
            Ok(found)
        }
        None => {
            let stocks = StockRepository::new(db.clone()).list_active().await?;
            info!(count = stocks.len(), "활성 종목 조회 완료");
            Ok(stocks.into_iter().map(|s| s.code).collect())
        }
    }
}
