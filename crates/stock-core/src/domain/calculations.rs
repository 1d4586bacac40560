//! 재무 보정 및 증가율 계산.
//!
//! 공시 원본의 4분기 값은 사업보고서의 연간 누적이므로 순수 4분기 실적은
//! `연간 - (1Q + 2Q + 3Q)`로 구합니다. 증가율은 직전 기간 대비
//! `(현재 - 이전) / |이전| * 100`입니다.

use rust_decimal::Decimal;
use std::collections::HashMap;

use super::financial::{FinancialPeriod, FinancialRow, Metric, Quarter};

/// 의미 있는 증가율로 인정하는 절대값 상한 (%).
pub const GROWTH_RATE_LIMIT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 0);

/// 증가율/비율 저장 소수점 자릿수.
const RATE_SCALE: u32 = 2;

/// 직전 기간 대비 증가율 (%).
///
/// # Returns
/// * `None` - 어느 한쪽이 `None`이거나 이전 값이 0인 경우
/// * `None` - 결과가 오버플로하거나 `±99,999,999`를 넘는 경우 (기준값이 0에 가까움)
/// * `Some(rate)` - `(current - previous) / |previous| * 100`, 소수 둘째 자리 반올림
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use stock_core::growth_rate;
///
/// let rate = growth_rate(Some(Decimal::from(50)), Some(Decimal::from(-100)));
/// assert_eq!(rate, Some(Decimal::from(150)));
/// ```
pub fn growth_rate(current: Option<Decimal>, previous: Option<Decimal>) -> Option<Decimal> {
    let (current, previous) = (current?, previous?);
    if previous.is_zero() {
        return None;
    }

    let rate = current
        .checked_sub(previous)?
        .checked_div(previous.abs())?
        .checked_mul(Decimal::ONE_HUNDRED)?;

    if rate.abs() > GROWTH_RATE_LIMIT {
        return None;
    }
    Some(rate.round_dp(RATE_SCALE))
}

/// 비율 (%) = `numerator / denominator * 100`.
///
/// 영업이익률/순이익률 계산에 사용합니다. 분모가 0이거나 값이 없으면 `None`.
pub fn ratio(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    let (numerator, denominator) = (numerator?, denominator?);
    if denominator.is_zero() {
        return None;
    }
    let value = numerator
        .checked_div(denominator)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(value.round_dp(RATE_SCALE))
}

/// 4분기 보정: `Q4 = 연간 누적 - (Q1 + Q2 + Q3)`.
///
/// 연도별로 묶어 4분기 레코드가 있는 연도마다 세 항목을 각각 보정합니다.
/// - 없는 분기(또는 값이 없는 분기)는 0으로 취급합니다.
/// - 4분기 원본 값이 `None`인 항목은 그대로 `None`으로 둡니다.
/// - 1~3분기가 모두 없으면 `Q4 = 원본 Q4`가 됩니다.
/// - 연간 레코드(`quarter == None`)는 건드리지 않습니다.
///
/// 입력 슬라이스의 4분기 레코드를 **제자리에서 수정**하고 같은 슬라이스를
/// 돌려줍니다. 연간 누적값이 따로 필요하면 호출 전에 복사해 두어야 합니다
/// ([`split_annual_and_quarterly`] 참고).
///
/// 같은 `(year, quarter)`가 여러 번 나오면 마지막 레코드를 사용합니다.
pub fn reconcile_q4(periods: &mut [FinancialPeriod]) -> &mut [FinancialPeriod] {
    let mut by_year: HashMap<i32, HashMap<Quarter, usize>> = HashMap::new();
    for (idx, period) in periods.iter().enumerate() {
        if let Some(quarter) = period.quarter {
            by_year.entry(period.year).or_default().insert(quarter, idx);
        }
    }

    for (year, quarters) in &by_year {
        let Some(&q4_idx) = quarters.get(&Quarter::Q4) else {
            continue;
        };

        for metric in Metric::ALL {
            let Some(raw_q4) = periods[q4_idx].metric(metric) else {
                continue;
            };

            let preceding = Quarter::PRECEDING_Q4
                .iter()
                .filter_map(|q| quarters.get(q))
                .filter_map(|&idx| periods[idx].metric(metric))
                .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value));

            let adjusted = preceding.and_then(|sum| raw_q4.checked_sub(sum));
            if adjusted.is_none() {
                tracing::warn!(
                    year = year,
                    metric = metric.as_str(),
                    "4분기 보정 중 오버플로, 값을 비웁니다"
                );
            }
            periods[q4_idx].set_metric(metric, adjusted);
        }
    }

    periods
}

/// 공시 원본을 연간/분기 목록으로 분리합니다.
///
/// 1. `(year, 분기)` 순으로 정렬합니다.
/// 2. 4분기 원본(연간 누적)을 연간 레코드로 복사합니다.
/// 3. 분기 목록에 [`reconcile_q4`]를 적용합니다.
///
/// 입력에 있던 연간 레코드(`quarter == None`)는 4분기 원본으로 대체되므로
/// 무시됩니다.
pub fn split_annual_and_quarterly(
    mut periods: Vec<FinancialPeriod>,
) -> (Vec<FinancialPeriod>, Vec<FinancialPeriod>) {
    periods.retain(|p| !p.is_annual());
    periods.sort_by_key(|p| p.sort_key());

    let annual: Vec<FinancialPeriod> = periods
        .iter()
        .filter(|p| p.quarter == Some(Quarter::Q4))
        .map(|p| FinancialPeriod {
            quarter: None,
            ..p.clone()
        })
        .collect();

    reconcile_q4(&mut periods);
    (annual, periods)
}

/// 직전 레코드 대비 증가율과 이익률을 붙인 행 목록을 만듭니다.
///
/// "직전 기간"은 목록의 바로 앞 원소입니다. 분기 목록이면 전분기,
/// 연간 목록이면 전년입니다. 중간에 빠진 기간이 없도록 하는 것은
/// 호출자 책임입니다.
pub fn with_growth(periods: &[FinancialPeriod]) -> Vec<FinancialRow> {
    periods
        .iter()
        .enumerate()
        .map(|(idx, period)| {
            let previous = idx.checked_sub(1).map(|i| &periods[i]);
            let growth = |metric: Metric| {
                previous.and_then(|prev| growth_rate(period.metric(metric), prev.metric(metric)))
            };

            FinancialRow {
                revenue_growth: growth(Metric::Revenue),
                operating_profit_growth: growth(Metric::OperatingProfit),
                net_income_growth: growth(Metric::NetIncome),
                operating_margin: ratio(period.operating_profit, period.revenue),
                net_margin: ratio(period.net_income, period.revenue),
                period: period.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn q(year: i32, quarter: Quarter, revenue: Option<Decimal>) -> FinancialPeriod {
        FinancialPeriod::quarterly(year, quarter).with_values(revenue, revenue, revenue)
    }

    #[test]
    fn test_growth_rate_basic() {
        assert_eq!(growth_rate(Some(dec!(110)), Some(dec!(100))), Some(dec!(10.00)));
        assert_eq!(growth_rate(Some(dec!(90)), Some(dec!(100))), Some(dec!(-10.00)));
    }

    #[test]
    fn test_growth_rate_null_and_zero_base() {
        assert_eq!(growth_rate(Some(dec!(5)), Some(Decimal::ZERO)), None);
        assert_eq!(growth_rate(Some(Decimal::ZERO), Some(Decimal::ZERO)), None);
        assert_eq!(growth_rate(None, Some(dec!(100))), None);
        assert_eq!(growth_rate(Some(dec!(100)), None), None);
    }

    #[test]
    fn test_growth_rate_negative_base_uses_abs() {
        assert_eq!(growth_rate(Some(dec!(50)), Some(dec!(-100))), Some(dec!(150.00)));
        // 적자 확대
        assert_eq!(growth_rate(Some(dec!(-150)), Some(dec!(-100))), Some(dec!(-50.00)));
    }

    #[test]
    fn test_growth_rate_rounding() {
        // 1/3 * 100 = 33.333...
        assert_eq!(growth_rate(Some(dec!(4)), Some(dec!(3))), Some(dec!(33.33)));
    }

    #[test]
    fn test_growth_rate_sanity_bound() {
        // 기준값이 0에 가까우면 의미 없는 증가율
        assert_eq!(growth_rate(Some(dec!(1000000)), Some(dec!(0.001))), None);
        assert_eq!(growth_rate(Some(dec!(99999999)), Some(dec!(1))), None);
        // 상한 이내는 허용
        assert_eq!(growth_rate(Some(dec!(999999)), Some(dec!(1))), Some(dec!(99999800)));
    }

    #[test]
    fn test_growth_rate_overflow_is_none() {
        assert_eq!(growth_rate(Some(Decimal::MAX), Some(Decimal::MIN)), None);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(Some(dec!(15)), Some(dec!(120))), Some(dec!(12.50)));
        assert_eq!(ratio(Some(dec!(15)), Some(Decimal::ZERO)), None);
        assert_eq!(ratio(None, Some(dec!(120))), None);
    }

    #[test]
    fn test_reconcile_q4_arithmetic() {
        let mut periods = vec![
            q(2024, Quarter::Q1, Some(dec!(100))),
            q(2024, Quarter::Q2, Some(dec!(120))),
            q(2024, Quarter::Q3, Some(dec!(90))),
            q(2024, Quarter::Q4, Some(dec!(400))),
        ];

        let adjusted = reconcile_q4(&mut periods);
        assert_eq!(adjusted[3].revenue, Some(dec!(90)));
        assert_eq!(adjusted[3].operating_profit, Some(dec!(90)));
        assert_eq!(adjusted[3].net_income, Some(dec!(90)));
        // 1~3분기는 그대로
        assert_eq!(adjusted[0].revenue, Some(dec!(100)));
    }

    #[test]
    fn test_reconcile_q4_mutates_in_place() {
        let mut periods = vec![
            q(2024, Quarter::Q1, Some(dec!(100))),
            q(2024, Quarter::Q4, Some(dec!(400))),
        ];
        reconcile_q4(&mut periods);
        assert_eq!(periods[1].revenue, Some(dec!(300)));
    }

    #[test]
    fn test_reconcile_q4_null_raw_stays_null() {
        let mut periods = vec![
            q(2024, Quarter::Q1, Some(dec!(100))),
            q(2024, Quarter::Q2, Some(dec!(120))),
            q(2024, Quarter::Q3, Some(dec!(90))),
            FinancialPeriod::quarterly(2024, Quarter::Q4).with_values(
                None,
                Some(dec!(50)),
                Some(dec!(40)),
            ),
        ];

        reconcile_q4(&mut periods);
        assert_eq!(periods[3].revenue, None);
        assert_eq!(periods[3].operating_profit, Some(dec!(-260)));
        assert_eq!(periods[3].net_income, Some(dec!(-270)));
    }

    #[test]
    fn test_reconcile_q4_missing_quarters_count_as_zero() {
        let mut periods = vec![
            q(2023, Quarter::Q2, Some(dec!(30))),
            q(2023, Quarter::Q3, None),
            q(2023, Quarter::Q4, Some(dec!(100))),
            // 1~3분기 없음 → 원본 그대로
            q(2024, Quarter::Q4, Some(dec!(80))),
        ];

        reconcile_q4(&mut periods);
        assert_eq!(periods[2].revenue, Some(dec!(70)));
        assert_eq!(periods[3].revenue, Some(dec!(80)));
    }

    #[test]
    fn test_reconcile_q4_year_without_q4_untouched() {
        let mut periods = vec![
            q(2025, Quarter::Q1, Some(dec!(10))),
            q(2025, Quarter::Q2, Some(dec!(20))),
        ];
        let before = periods.clone();
        reconcile_q4(&mut periods);
        assert_eq!(periods, before);
    }

    #[test]
    fn test_reconcile_q4_ignores_annual_records() {
        let mut periods = vec![
            FinancialPeriod::annual(2024).with_values(Some(dec!(400)), None, None),
            q(2024, Quarter::Q1, Some(dec!(100))),
            q(2024, Quarter::Q4, Some(dec!(400))),
        ];
        reconcile_q4(&mut periods);
        assert_eq!(periods[0].revenue, Some(dec!(400)));
        assert_eq!(periods[2].revenue, Some(dec!(300)));
    }

    #[test]
    fn test_split_snapshots_annual_before_adjusting() {
        let filings = vec![
            q(2024, Quarter::Q4, Some(dec!(400))),
            q(2024, Quarter::Q3, Some(dec!(90))),
            q(2024, Quarter::Q1, Some(dec!(100))),
            q(2024, Quarter::Q2, Some(dec!(120))),
        ];

        let (annual, quarterly) = split_annual_and_quarterly(filings);

        assert_eq!(annual.len(), 1);
        assert!(annual[0].is_annual());
        assert_eq!(annual[0].revenue, Some(dec!(400)));

        let quarters: Vec<_> = quarterly.iter().filter_map(|p| p.quarter).collect();
        assert_eq!(quarters, vec![Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4]);
        assert_eq!(quarterly[3].revenue, Some(dec!(90)));
    }

    #[test]
    fn test_with_growth_uses_previous_index() {
        let periods = vec![
            FinancialPeriod::quarterly(2024, Quarter::Q3).with_values(
                Some(dec!(100)),
                Some(dec!(10)),
                Some(dec!(-100)),
            ),
            FinancialPeriod::quarterly(2024, Quarter::Q4).with_values(
                Some(dec!(110)),
                Some(dec!(0)),
                Some(dec!(50)),
            ),
        ];

        let rows = with_growth(&periods);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].revenue_growth, None);
        assert_eq!(rows[0].operating_margin, Some(dec!(10.00)));

        assert_eq!(rows[1].revenue_growth, Some(dec!(10.00)));
        assert_eq!(rows[1].operating_profit_growth, Some(dec!(-100.00)));
        assert_eq!(rows[1].net_income_growth, Some(dec!(150.00)));
        assert_eq!(rows[1].operating_margin, Some(dec!(0)));
        assert_eq!(rows[1].growth(Metric::Revenue), Some(dec!(10.00)));
    }
}
