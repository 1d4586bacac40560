//! 재무 저장소.
//!
//! - `financial_filing`: 공시 원본 (4분기 = 연간 누적)
//! - `financial`: 보정된 기간 + 증가율/이익률
//!
//! 기간은 `period` 순번으로 저장하며 연간은 0, 분기는 1~4입니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use stock_core::{FinancialPeriod, FinancialRow, Quarter};
use tracing::{debug, instrument, warn};

use super::postgres::Database;
use crate::error::{DataError, Result};
use crate::sync::UpsertOutcome;

/// 기간 → 저장 순번 (연간 0, 분기 1~4).
pub fn period_ordinal(period: &FinancialPeriod) -> i16 {
    period.quarter.map(|q| i16::from(q.ordinal())).unwrap_or(0)
}

/// 저장 순번 → 분기 (`Ok(None)`은 연간).
pub fn quarter_from_ordinal(ordinal: i16) -> Result<Option<Quarter>> {
    match ordinal {
        0 => Ok(None),
        n => u8::try_from(n)
            .ok()
            .and_then(Quarter::from_ordinal)
            .map(Some)
            .ok_or_else(|| DataError::InvalidData(format!("invalid period ordinal: {}", n))),
    }
}

#[derive(Debug, FromRow)]
struct PeriodRow {
    year: i32,
    period: i16,
    revenue: Option<Decimal>,
    operating_profit: Option<Decimal>,
    net_income: Option<Decimal>,
    is_estimated: bool,
}

impl TryFrom<PeriodRow> for FinancialPeriod {
    type Error = DataError;

    fn try_from(row: PeriodRow) -> Result<Self> {
        Ok(FinancialPeriod {
            year: row.year,
            quarter: quarter_from_ordinal(row.period)?,
            revenue: row.revenue,
            operating_profit: row.operating_profit,
            net_income: row.net_income,
            is_estimated: row.is_estimated,
        })
    }
}

/// 재무 행 저장 통계.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinancialSaveStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl FinancialSaveStats {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn merge(&mut self, other: &FinancialSaveStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

/// 공시 원본 저장 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilingSaveStats {
    pub saved: usize,
    pub failed: usize,
}

/// 재무 저장소 추상화.
///
/// 기본 메서드인 `save_filings`/`save_rows`는 레코드 하나의 실패를 기록만 하고
/// 나머지를 계속 저장합니다.
#[async_trait]
pub trait FinancialStore: Send + Sync {
    /// 공시 원본 분기 레코드를 조회합니다 (연도, 분기 순).
    async fn load_filings(&self, stock_code: &str) -> Result<Vec<FinancialPeriod>>;

    /// 공시 원본 분기 레코드 하나를 upsert합니다.
    async fn save_filing(&self, stock_code: &str, filing: &FinancialPeriod) -> Result<()>;

    /// 보정된 재무 행 하나를 upsert합니다.
    async fn upsert_row(&self, stock_code: &str, row: &FinancialRow) -> Result<UpsertOutcome>;

    /// 지정한 종목의 보정된 재무 행을 삭제합니다 (공시 원본은 유지).
    async fn clear_rows(&self, stock_codes: &[String]) -> Result<u64>;

    /// 공시 원본 분기 레코드를 저장합니다. 연간 레코드는 건너뜁니다.
    async fn save_filings(&self, stock_code: &str, filings: &[FinancialPeriod]) -> FilingSaveStats {
        let mut stats = FilingSaveStats::default();
        for filing in filings.iter().filter(|f| !f.is_annual()) {
            match self.save_filing(stock_code, filing).await {
                Ok(()) => stats.saved += 1,
                Err(e) => {
                    warn!(stock_code = stock_code, period = %filing.label(), error = %e, "공시 원본 저장 실패");
                    stats.failed += 1;
                }
            }
        }
        stats
    }

    /// 재무 행 목록을 저장합니다.
    async fn save_rows(&self, stock_code: &str, rows: &[FinancialRow]) -> FinancialSaveStats {
        let mut stats = FinancialSaveStats::default();
        for row in rows {
            match self.upsert_row(stock_code, row).await {
                Ok(outcome) => stats.record(outcome),
                Err(e) => {
                    warn!(stock_code = stock_code, period = %row.period.label(), error = %e, "재무 저장 실패");
                    stats.failed += 1;
                }
            }
        }
        debug!(stock_code = stock_code, ?stats, "재무 저장 완료");
        stats
    }
}

/// PostgreSQL 재무 repository.
#[derive(Clone)]
pub struct FinancialRepository {
    db: Database,
}

impl FinancialRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FinancialStore for FinancialRepository {
    #[instrument(skip(self))]
    async fn load_filings(&self, stock_code: &str) -> Result<Vec<FinancialPeriod>> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT year, period, revenue, operating_profit, net_income, is_estimated
            FROM financial_filing
            WHERE stock_code = $1
            ORDER BY year, period
            "#,
        )
        .bind(stock_code)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(FinancialPeriod::try_from).collect()
    }

    async fn save_filing(&self, stock_code: &str, filing: &FinancialPeriod) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO financial_filing
                (stock_code, year, period, revenue, operating_profit, net_income, is_estimated)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (stock_code, year, period) DO UPDATE SET
                revenue = EXCLUDED.revenue,
                operating_profit = EXCLUDED.operating_profit,
                net_income = EXCLUDED.net_income,
                is_estimated = EXCLUDED.is_estimated
            "#,
        )
        .bind(stock_code)
        .bind(filing.year)
        .bind(period_ordinal(filing))
        .bind(filing.revenue)
        .bind(filing.operating_profit)
        .bind(filing.net_income)
        .bind(filing.is_estimated)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// 기존 행과 값이 모두 같으면 갱신하지 않고 [`UpsertOutcome::Unchanged`]를 반환합니다.
    #[instrument(skip(self, row), fields(period = %row.period.label()))]
    async fn upsert_row(&self, stock_code: &str, row: &FinancialRow) -> Result<UpsertOutcome> {
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO financial (
                stock_code, year, period, revenue, operating_profit, net_income,
                revenue_growth, operating_profit_growth, net_income_growth,
                operating_margin, net_margin, is_estimated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (stock_code, year, period) DO UPDATE SET
                revenue = EXCLUDED.revenue,
                operating_profit = EXCLUDED.operating_profit,
                net_income = EXCLUDED.net_income,
                revenue_growth = EXCLUDED.revenue_growth,
                operating_profit_growth = EXCLUDED.operating_profit_growth,
                net_income_growth = EXCLUDED.net_income_growth,
                operating_margin = EXCLUDED.operating_margin,
                net_margin = EXCLUDED.net_margin,
                is_estimated = EXCLUDED.is_estimated,
                updated_at = NOW()
            WHERE (
                financial.revenue, financial.operating_profit, financial.net_income,
                financial.revenue_growth, financial.operating_profit_growth, financial.net_income_growth,
                financial.operating_margin, financial.net_margin, financial.is_estimated
            ) IS DISTINCT FROM (
                EXCLUDED.revenue, EXCLUDED.operating_profit, EXCLUDED.net_income,
                EXCLUDED.revenue_growth, EXCLUDED.operating_profit_growth, EXCLUDED.net_income_growth,
                EXCLUDED.operating_margin, EXCLUDED.net_margin, EXCLUDED.is_estimated
            )
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(stock_code)
        .bind(row.period.year)
        .bind(period_ordinal(&row.period))
        .bind(row.period.revenue)
        .bind(row.period.operating_profit)
        .bind(row.period.net_income)
        .bind(row.revenue_growth)
        .bind(row.operating_profit_growth)
        .bind(row.net_income_growth)
        .bind(row.operating_margin)
        .bind(row.net_margin)
        .bind(row.period.is_estimated)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(match inserted {
            Some(true) => UpsertOutcome::Created,
            Some(false) => UpsertOutcome::Updated,
            None => UpsertOutcome::Unchanged,
        })
    }

    #[instrument(skip(self), fields(count = stock_codes.len()))]
    async fn clear_rows(&self, stock_codes: &[String]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM financial WHERE stock_code = ANY($1)")
            .bind(stock_codes)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_ordinal_round_trip() {
        assert_eq!(period_ordinal(&FinancialPeriod::annual(2024)), 0);
        assert_eq!(
            period_ordinal(&FinancialPeriod::quarterly(2024, Quarter::Q4)),
            4
        );
        assert_eq!(quarter_from_ordinal(0).unwrap(), None);
        assert_eq!(quarter_from_ordinal(3).unwrap(), Some(Quarter::Q3));
        assert!(quarter_from_ordinal(5).is_err());
        assert!(quarter_from_ordinal(-1).is_err());
    }

    #[test]
    fn test_save_stats_record_and_merge() {
        let mut stats = FinancialSaveStats::default();
        stats.record(UpsertOutcome::Created);
        stats.record(UpsertOutcome::Unchanged);

        let mut total = FinancialSaveStats {
            failed: 1,
            ..Default::default()
        };
        total.merge(&stats);
        assert_eq!(
            total,
            FinancialSaveStats {
                created: 1,
                updated: 0,
                unchanged: 1,
                failed: 1
            }
        );
    }
}
