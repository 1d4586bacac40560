//! 키움 REST API 시계열 카탈로그.
//!
//! 시리즈마다 API ID, 엔드포인트, 응답 배열 키, 기본 수집 기간,
//! 요청 본문, 응답 필드 → 컬럼 매핑이 다릅니다.

use chrono::NaiveDate;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use stock_core::{days_before, format_compact_date};

use crate::error::DataError;

/// 최신일 모드에서 조회 시작일을 잡는 기간 (휴장일 고려).
const LATEST_LOOKBACK_DAYS: u32 = 7;

/// 수집 대상 시계열.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// 일봉
    DailyChart,
    /// 주봉
    WeeklyChart,
    /// 월봉
    MonthlyChart,
    /// 투자자별 매매동향
    InvestorTrend,
    /// 공매도 추이
    ShortSelling,
}

const CHART_FIELDS: &[(&str, &str)] = &[
    ("open_pric", "opening_price"),
    ("high_pric", "high_price"),
    ("low_pric", "low_price"),
    ("cur_prc", "closing_price"),
    ("pred_pre", "price_change"),
    ("trde_qty", "trading_volume"),
    ("trde_prica", "trading_value"),
];

const INVESTOR_FIELDS: &[(&str, &str)] = &[
    ("ind_invsr", "individual"),
    ("frgnr_invsr", "foreign"),
    ("orgn", "institution"),
    ("natfor", "domestic_foreign"),
    ("fnnc_invt", "financial"),
    ("insrnc", "insurance"),
    ("invtrt", "investment_trust"),
    ("etc_fnnc", "other_finance"),
    ("bank", "bank"),
    ("penfnd_etc", "pension_fund"),
    ("samo_fund", "private_fund"),
    ("etc_corp", "other_corporation"),
];

const SHORT_SELLING_FIELDS: &[(&str, &str)] = &[
    ("trde_qty", "trading_volume"),
    ("shrts_qty", "short_volume"),
    ("ovr_shrts_qty", "cumulative_short_volume"),
    ("trde_wght", "trading_weight"),
    ("shrts_trde_prica", "short_trading_value"),
    ("shrts_avg_pric", "short_average_price"),
];

impl SeriesKind {
    pub const ALL: [SeriesKind; 5] = [
        SeriesKind::DailyChart,
        SeriesKind::WeeklyChart,
        SeriesKind::MonthlyChart,
        SeriesKind::InvestorTrend,
        SeriesKind::ShortSelling,
    ];

    /// 저장 시 시리즈 구분값.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::DailyChart => "daily_chart",
            SeriesKind::WeeklyChart => "weekly_chart",
            SeriesKind::MonthlyChart => "monthly_chart",
            SeriesKind::InvestorTrend => "investor_trend",
            SeriesKind::ShortSelling => "short_selling",
        }
    }

    /// `api-id` 헤더 값.
    pub fn api_id(&self) -> &'static str {
        match self {
            SeriesKind::DailyChart => "ka10081",
            SeriesKind::WeeklyChart => "ka10082",
            SeriesKind::MonthlyChart => "ka10083",
            SeriesKind::InvestorTrend => "ka10059",
            SeriesKind::ShortSelling => "ka10014",
        }
    }

    /// `/api/dostk/{endpoint}`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            SeriesKind::DailyChart | SeriesKind::WeeklyChart | SeriesKind::MonthlyChart => "chart",
            SeriesKind::InvestorTrend => "stkinfo",
            SeriesKind::ShortSelling => "shsa",
        }
    }

    /// 응답 배열 후보 키 (앞에서부터 먼저 찾은 배열 사용).
    pub fn data_keys(&self) -> &'static [&'static str] {
        match self {
            SeriesKind::DailyChart => &["stk_dt_pole_chart_qry", "chart", "data", "result", "output"],
            SeriesKind::WeeklyChart => &[
                "stk_stk_pole_chart_qry",
                "stk_wk_pole_chart_qry",
                "stk_dt_pole_chart_qry",
                "stk_weekly_chart",
                "chart",
                "data",
                "result",
                "output",
            ],
            SeriesKind::MonthlyChart => &[
                "stk_mth_pole_chart_qry",
                "stk_month_chart",
                "chart",
                "data",
                "result",
                "output",
            ],
            SeriesKind::InvestorTrend => &[
                "stk_invsr_orgn",
                "invsr_stk_daly",
                "stk_invsr_daly",
                "data",
                "result",
                "output",
            ],
            SeriesKind::ShortSelling => &["shrts_trnsn", "data", "result", "output"],
        }
    }

    /// 전체 모드 기본 수집 기간 (일).
    pub fn default_window_days(&self) -> u32 {
        match self {
            SeriesKind::DailyChart => 730,
            SeriesKind::WeeklyChart => 1460,
            SeriesKind::MonthlyChart => 2190,
            SeriesKind::InvestorTrend => 180,
            SeriesKind::ShortSelling => 60,
        }
    }

    /// 응답 필드 → 저장 컬럼 매핑.
    pub fn field_mappings(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            SeriesKind::DailyChart | SeriesKind::WeeklyChart | SeriesKind::MonthlyChart => {
                CHART_FIELDS
            }
            SeriesKind::InvestorTrend => INVESTOR_FIELDS,
            SeriesKind::ShortSelling => SHORT_SELLING_FIELDS,
        }
    }

    /// 요청 본문.
    ///
    /// `base`는 기준일(보통 오늘), `start`는 조회 시작일입니다.
    /// 기간을 받는 API는 공매도뿐이며 나머지는 기준일부터 과거로 내려갑니다.
    pub fn request_body(&self, stock_code: &str, base: NaiveDate, start: NaiveDate) -> Value {
        let base_dt = format_compact_date(base);
        match self {
            SeriesKind::DailyChart | SeriesKind::WeeklyChart | SeriesKind::MonthlyChart => json!({
                "stk_cd": stock_code,
                "base_dt": base_dt,
                "upd_stkpc_tp": "1",
            }),
            SeriesKind::InvestorTrend => json!({
                "dt": base_dt,
                "stk_cd": stock_code,
                "amt_qty_tp": "1",
                "trde_tp": "0",
                "unit_tp": "1000",
            }),
            SeriesKind::ShortSelling => json!({
                "stk_cd": stock_code,
                "tm_tp": "1",
                "strt_dt": format_compact_date(start),
                "end_dt": base_dt,
            }),
        }
    }

    /// 전체 모드 컷오프 (기준일 - 기간).
    pub fn cutoff(&self, base: NaiveDate, days: Option<u32>) -> NaiveDate {
        days_before(base, days.unwrap_or_else(|| self.default_window_days()))
    }

    /// 최신일 모드 조회 시작일.
    pub fn latest_start(&self, base: NaiveDate) -> NaiveDate {
        days_before(base, LATEST_LOOKBACK_DAYS)
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeriesKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "daily_chart" | "daily" => Ok(SeriesKind::DailyChart),
            "weekly_chart" | "weekly" => Ok(SeriesKind::WeeklyChart),
            "monthly_chart" | "monthly" => Ok(SeriesKind::MonthlyChart),
            "investor_trend" | "investor" => Ok(SeriesKind::InvestorTrend),
            "short_selling" | "short" => Ok(SeriesKind::ShortSelling),
            other => Err(DataError::ConfigError(format!("Unknown series: {}", other))),
        }
    }
}
