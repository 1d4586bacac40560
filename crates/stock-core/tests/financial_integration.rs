//! 재무 보정/증가율 통합 테스트
//!
//! 공시 원본 → 연간/분기 분리 → 증가율 계산까지 한 번에 확인합니다.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stock_core::{
    growth_rate, reconcile_q4, split_annual_and_quarterly, with_growth, FinancialPeriod, Metric,
    Quarter, GROWTH_RATE_LIMIT,
};

fn filing(year: i32, quarter: Quarter, revenue: Decimal, op: Decimal, net: Decimal) -> FinancialPeriod {
    FinancialPeriod::quarterly(year, quarter).with_values(Some(revenue), Some(op), Some(net))
}

/// 2년치 공시 원본 (4분기는 연간 누적)
fn two_years_of_filings() -> Vec<FinancialPeriod> {
    vec![
        filing(2024, Quarter::Q4, dec!(400), dec!(40), dec!(30)),
        filing(2023, Quarter::Q1, dec!(80), dec!(8), dec!(6)),
        filing(2023, Quarter::Q2, dec!(90), dec!(9), dec!(7)),
        filing(2023, Quarter::Q3, dec!(100), dec!(10), dec!(8)),
        filing(2023, Quarter::Q4, dec!(350), dec!(35), dec!(25)),
        filing(2024, Quarter::Q1, dec!(100), dec!(10), dec!(8)),
        filing(2024, Quarter::Q2, dec!(120), dec!(12), dec!(9)),
        filing(2024, Quarter::Q3, dec!(90), dec!(9), dec!(7)),
    ]
}

#[test]
fn test_pipeline_annual_rows() {
    let (annual, _) = split_annual_and_quarterly(two_years_of_filings());
    let rows = with_growth(&annual);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].period.year, 2023);
    assert_eq!(rows[0].period.revenue, Some(dec!(350)));
    assert_eq!(rows[0].revenue_growth, None);

    assert_eq!(rows[1].period.year, 2024);
    assert_eq!(rows[1].period.revenue, Some(dec!(400)));
    // (400 - 350) / 350 * 100 = 14.2857...
    assert_eq!(rows[1].revenue_growth, Some(dec!(14.29)));
    assert_eq!(rows[1].operating_margin, Some(dec!(10.00)));
    assert_eq!(rows[1].net_margin, Some(dec!(7.50)));
}

#[test]
fn test_pipeline_quarterly_rows() {
    let (_, quarterly) = split_annual_and_quarterly(two_years_of_filings());
    let rows = with_growth(&quarterly);

    let labels: Vec<String> = rows.iter().map(|r| r.period.label()).collect();
    assert_eq!(
        labels,
        vec!["2023 1Q", "2023 2Q", "2023 3Q", "2023 4Q", "2024 1Q", "2024 2Q", "2024 3Q", "2024 4Q"]
    );

    // 2023 4Q = 350 - (80 + 90 + 100) = 80
    assert_eq!(rows[3].period.revenue, Some(dec!(80)));
    // 2024 4Q = 400 - (100 + 120 + 90) = 90
    assert_eq!(rows[7].period.revenue, Some(dec!(90)));
    assert_eq!(rows[7].period.operating_profit, Some(dec!(9)));
    assert_eq!(rows[7].period.net_income, Some(dec!(6)));

    // 2024 1Q는 보정된 2023 4Q(80) 대비: (100 - 80) / 80 * 100 = 25
    assert_eq!(rows[4].revenue_growth, Some(dec!(25.00)));
    // 2024 4Q는 3Q(90) 대비 0%
    assert_eq!(rows[7].growth(Metric::Revenue), Some(dec!(0.00)));
}

#[test]
fn test_pipeline_turnaround_growth() {
    let periods = vec![
        FinancialPeriod::annual(2023).with_values(Some(dec!(1000)), Some(dec!(-100)), Some(dec!(0))),
        FinancialPeriod::annual(2024).with_values(Some(dec!(1100)), Some(dec!(50)), Some(dec!(20))),
    ];
    let rows = with_growth(&periods);

    assert_eq!(rows[1].revenue_growth, Some(dec!(10.00)));
    assert_eq!(rows[1].operating_profit_growth, Some(dec!(150.00)));
    // 전년 0 → 계산 불가
    assert_eq!(rows[1].net_income_growth, None);
}

proptest! {
    #[test]
    fn prop_reconciled_quarters_sum_to_annual(
        q1 in -1_000_000i64..1_000_000,
        q2 in -1_000_000i64..1_000_000,
        q3 in -1_000_000i64..1_000_000,
        annual in -10_000_000i64..10_000_000,
    ) {
        let value = |v: i64| Some(Decimal::from(v));
        let mut periods = vec![
            FinancialPeriod::quarterly(2024, Quarter::Q1).with_values(value(q1), None, None),
            FinancialPeriod::quarterly(2024, Quarter::Q2).with_values(value(q2), None, None),
            FinancialPeriod::quarterly(2024, Quarter::Q3).with_values(value(q3), None, None),
            FinancialPeriod::quarterly(2024, Quarter::Q4).with_values(value(annual), None, None),
        ];

        reconcile_q4(&mut periods);

        let total: Decimal = periods.iter().filter_map(|p| p.revenue).sum();
        prop_assert_eq!(total, Decimal::from(annual));
        prop_assert_eq!(periods[3].operating_profit, None);
    }

    #[test]
    fn prop_growth_rate_is_bounded_and_rounded(
        current in -1_000_000_000i64..1_000_000_000,
        previous in -1_000_000_000i64..1_000_000_000,
    ) {
        let rate = growth_rate(Some(Decimal::from(current)), Some(Decimal::from(previous)));
        if previous == 0 {
            prop_assert_eq!(rate, None);
        }
        if let Some(rate) = rate {
            prop_assert!(rate.abs() <= GROWTH_RATE_LIMIT);
            prop_assert!(rate.scale() <= 2);
        }
    }

    #[test]
    fn prop_growth_rate_sign_follows_direction(
        previous in 1i64..1_000_000,
        delta in 1i64..1_000_000,
    ) {
        let prev = Decimal::from(previous);
        let up = growth_rate(Some(prev + Decimal::from(delta)), Some(prev));
        let down = growth_rate(Some(prev - Decimal::from(delta)), Some(prev));
        prop_assert!(up.map(|r| r >= Decimal::ZERO).unwrap_or(true));
        prop_assert!(down.map(|r| r <= Decimal::ZERO).unwrap_or(true));
    }
}
