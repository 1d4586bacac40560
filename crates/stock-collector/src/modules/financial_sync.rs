//! 재무제표 보정 모듈.
//!
//! 공시 원본(4분기 = 연간 누적)을 읽어
//! 1. 4분기 원본을 연간 레코드로 복사하고
//! 2. 분기 목록의 4분기를 `연간 - (1Q + 2Q + 3Q)`로 보정한 뒤
//! 3. 직전 기간 대비 증가율과 이익률을 계산해 `financial` 테이블에 저장합니다.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use stock_core::{split_annual_and_quarterly, with_growth, FinancialPeriod, FinancialRow};
use stock_data::{Database, FinancialRepository, FinancialSaveStats, FinancialStore};
use tracing::{debug, error, info, warn};

use crate::{CollectionStats, CollectorError, Result};

/// 저장 대상 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FinancialScope {
    /// 연간만
    Annual,
    /// 분기만
    Quarterly,
    /// 둘 다
    #[default]
    All,
}

impl FinancialScope {
    pub fn includes_annual(&self) -> bool {
        matches!(self, FinancialScope::Annual | FinancialScope::All)
    }

    pub fn includes_quarterly(&self) -> bool {
        matches!(self, FinancialScope::Quarterly | FinancialScope::All)
    }
}

/// 재무 보정 옵션.
#[derive(Debug, Clone, Default)]
pub struct FinancialSyncOptions {
    pub scope: FinancialScope,
    /// 공시 원본 JSON (종목코드 → 분기 레코드 배열). 있으면 먼저 `financial_filing`에 저장
    pub input: Option<PathBuf>,
    /// 보정 전에 기존 `financial` 행 삭제
    pub clear: bool,
}

/// 입력 파일 형식: `{"005930": [{"year": 2024, "quarter": "1Q", "revenue": "100", ...}]}`
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct FilingInput(pub BTreeMap<String, Vec<FinancialPeriod>>);

impl FilingInput {
    pub fn from_json(text: &str) -> Result<Self> {
        let input: FilingInput = serde_json::from_str(text)?;
        if let Some((code, _)) = input
            .0
            .iter()
            .find(|(_, periods)| periods.iter().any(FinancialPeriod::is_annual))
        {
            return Err(CollectorError::Input(format!(
                "{}: 분기(quarter)가 없는 레코드가 있습니다",
                code
            )));
        }
        Ok(input)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// 공시 원본에서 저장할 재무 행을 만듭니다.
///
/// 연간 행은 4분기 원본(보정 전), 분기 행은 4분기 보정 후 값입니다.
pub fn build_rows(filings: Vec<FinancialPeriod>, scope: FinancialScope) -> Vec<FinancialRow> {
    let (annual, quarterly) = split_annual_and_quarterly(filings);

    let mut rows = Vec::new();
    if scope.includes_annual() {
        rows.extend(with_growth(&annual));
    }
    if scope.includes_quarterly() {
        rows.extend(with_growth(&quarterly));
    }
    rows
}

/// 재무 보정 실행.
pub async fn reconcile_financials(
    db: &Database,
    codes: &[String],
    options: &FinancialSyncOptions,
) -> Result<CollectionStats> {
    let input = options.input.as_deref().map(FilingInput::load).transpose()?;
    let repository = FinancialRepository::new(db.clone());
    reconcile_with_store(&repository, codes, options, input.as_ref()).await
}

/// 저장소를 받아 재무 보정을 실행합니다.
///
/// `--clear`는 `codes`에 있는 종목의 보정 행만 지웁니다. 종목 하나의 저장 실패는
/// 실패 목록에 남기고 다음 종목을 계속 처리합니다.
pub async fn reconcile_with_store<S>(
    store: &S,
    codes: &[String],
    options: &FinancialSyncOptions,
    input: Option<&FilingInput>,
) -> Result<CollectionStats>
where
    S: FinancialStore + ?Sized,
{
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    if options.clear {
        let deleted = store.clear_rows(codes).await?;
        warn!(stocks = codes.len(), deleted = deleted, "기존 재무 행 삭제");
    }

    if let Some(input) = input {
        let mut saved = 0;
        for code in codes {
            let Some(filings) = input.0.get(code) else {
                continue;
            };
            let result = store.save_filings(code, filings).await;
            saved += result.saved;
            if result.failed > 0 {
                error!(stock_code = %code, failed = result.failed, "공시 원본 일부 저장 실패");
                stats.failed_records += result.failed;
                stats
                    .error_list
                    .push((code.clone(), format!("공시 원본 {}건 저장 실패", result.failed)));
            }
        }
        info!(saved = saved, "공시 원본 저장 완료");
    }

    info!(stocks = codes.len(), scope = ?options.scope, "재무 보정 시작");

    for (idx, code) in codes.iter().enumerate() {
        let filings = match store.load_filings(code).await {
            Ok(filings) => filings,
            Err(e) => {
                error!(stock_code = %code, error = %e, "공시 원본 조회 실패");
                stats.record_error(code, e);
                continue;
            }
        };

        stats.total += 1;
        if filings.is_empty() {
            debug!("[{}/{}] {}: 데이터 없음", idx + 1, codes.len(), code);
            stats.empty += 1;
            continue;
        }

        let rows = build_rows(filings, options.scope);
        log_rows(code, &rows);

        let saved = store.save_rows(code, &rows).await;
        apply_save_stats(&mut stats, code, &saved);
        info!(
            "[{}/{}] {}: 신규 {}, 업데이트 {}, 스킵 {}",
            idx + 1,
            codes.len(),
            code,
            saved.created,
            saved.updated,
            saved.unchanged
        );
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

fn apply_save_stats(stats: &mut CollectionStats, code: &str, saved: &FinancialSaveStats) {
    stats.created += saved.created;
    stats.updated += saved.updated;
    stats.unchanged += saved.unchanged;
    stats.failed_records += saved.failed;

    if saved.failed > 0 {
        stats.errors += 1;
        stats
            .error_list
            .push((code.to_string(), format!("재무 행 {}건 저장 실패", saved.failed)));
    } else {
        stats.success += 1;
    }
}

/// 증가율 표시 (`+10.0%`, `-`).
pub fn format_growth(value: Option<Decimal>) -> String {
    match value {
        Some(v) if v > Decimal::ZERO => format!("+{:.1}%", v),
        Some(v) => format!("{:.1}%", v),
        None => "-".to_string(),
    }
}

fn log_rows(code: &str, rows: &[FinancialRow]) {
    for row in rows {
        debug!(
            stock_code = code,
            period = %row.period.label(),
            revenue = ?row.period.revenue,
            operating_profit = ?row.period.operating_profit,
            net_income = ?row.period.net_income,
            revenue_growth = %format_growth(row.revenue_growth),
            operating_profit_growth = %format_growth(row.operating_profit_growth),
            net_income_growth = %format_growth(row.net_income_growth),
            operating_margin = ?row.operating_margin,
            "재무 행"
        );
    }
    if rows.iter().all(|r| r.period.is_empty()) {
        warn!(stock_code = code, "모든 기간의 값이 비어 있습니다");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stock_core::Quarter;

    fn filing(year: i32, quarter: Quarter, revenue: Decimal) -> FinancialPeriod {
        FinancialPeriod::quarterly(year, quarter).with_values(Some(revenue), None, None)
    }

    fn filings() -> Vec<FinancialPeriod> {
        vec![
            filing(2024, Quarter::Q1, dec!(100)),
            filing(2024, Quarter::Q2, dec!(120)),
            filing(2024, Quarter::Q3, dec!(90)),
            filing(2024, Quarter::Q4, dec!(400)),
        ]
    }

    #[test]
    fn test_build_rows_by_scope() {
        let annual = build_rows(filings(), FinancialScope::Annual);
        assert_eq!(annual.len(), 1);
        assert_eq!(annual[0].period.revenue, Some(dec!(400)));

        let quarterly = build_rows(filings(), FinancialScope::Quarterly);
        assert_eq!(quarterly.len(), 4);
        assert_eq!(quarterly[3].period.revenue, Some(dec!(90)));
        assert_eq!(quarterly[3].revenue_growth, Some(dec!(0.00)));

        assert_eq!(build_rows(filings(), FinancialScope::All).len(), 5);
    }

    #[test]
    fn test_filing_input_from_json() {
        let input = FilingInput::from_json(
            r#"{"005930": [
                {"year": 2024, "quarter": "1Q", "revenue": "100", "operating_profit": 10, "net_income": null},
                {"year": 2024, "quarter": "4Q", "revenue": "400", "operating_profit": "40", "net_income": "30"}
            ]}"#,
        )
        .unwrap();

        let periods = &input.0["005930"];
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].quarter, Some(Quarter::Q1));
        assert_eq!(periods[0].operating_profit, Some(dec!(10)));
        assert_eq!(periods[0].net_income, None);
        assert!(!periods[0].is_estimated);
    }

    #[test]
    fn test_filing_input_rejects_annual_records() {
        let result = FilingInput::from_json(r#"{"005930": [{"year": 2024, "quarter": null}]}"#);
        assert!(matches!(result, Err(CollectorError::Input(_))));
    }

    #[test]
    fn test_format_growth() {
        assert_eq!(format_growth(Some(dec!(10.00))), "+10.0%");
        assert_eq!(format_growth(Some(dec!(-3.25))), "-3.2%");
        assert_eq!(format_growth(None), "-");
    }
}
