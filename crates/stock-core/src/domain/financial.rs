//! 재무 기간 레코드.
//!
//! 공시 원본은 1~3분기를 3개월 단위로, 4분기는 사업보고서의 연간 누적값으로
//! 제공합니다. 4분기 보정은 [`reconcile_q4`](crate::reconcile_q4)를 참고하세요.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 분기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    #[serde(rename = "1Q")]
    Q1,
    #[serde(rename = "2Q")]
    Q2,
    #[serde(rename = "3Q")]
    Q3,
    #[serde(rename = "4Q")]
    Q4,
}

impl Quarter {
    /// 1~3분기 (4분기 보정 시 차감 대상).
    pub const PRECEDING_Q4: [Quarter; 3] = [Quarter::Q1, Quarter::Q2, Quarter::Q3];

    /// 분기 순번 (1..=4).
    pub fn ordinal(&self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    /// 순번에서 분기 생성.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q", self.ordinal())
    }
}

impl FromStr for Quarter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1Q" | "Q1" | "1" => Ok(Quarter::Q1),
            "2Q" | "Q2" | "2" => Ok(Quarter::Q2),
            "3Q" | "Q3" | "3" => Ok(Quarter::Q3),
            "4Q" | "Q4" | "4" => Ok(Quarter::Q4),
            other => Err(CoreError::InvalidQuarter(other.to_string())),
        }
    }
}

/// 재무 항목.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// 매출액
    Revenue,
    /// 영업이익
    OperatingProfit,
    /// 당기순이익
    NetIncome,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Revenue, Metric::OperatingProfit, Metric::NetIncome];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::OperatingProfit => "operating_profit",
            Metric::NetIncome => "net_income",
        }
    }
}

/// 연간 또는 분기 재무 실적.
///
/// `quarter == None`이면 연간(누적) 레코드입니다.
/// 한 종목 안에서 `(year, quarter)`는 유일합니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub year: i32,
    pub quarter: Option<Quarter>,
    pub revenue: Option<Decimal>,
    pub operating_profit: Option<Decimal>,
    pub net_income: Option<Decimal>,
    /// 컨센서스 추정치 여부
    #[serde(default)]
    pub is_estimated: bool,
}

impl FinancialPeriod {
    /// 분기 레코드 생성.
    pub fn quarterly(year: i32, quarter: Quarter) -> Self {
        Self {
            year,
            quarter: Some(quarter),
            ..Default::default()
        }
    }

    /// 연간 레코드 생성.
    pub fn annual(year: i32) -> Self {
        Self {
            year,
            quarter: None,
            ..Default::default()
        }
    }

    /// 세 항목 값을 설정한 레코드를 반환합니다.
    pub fn with_values(
        mut self,
        revenue: Option<Decimal>,
        operating_profit: Option<Decimal>,
        net_income: Option<Decimal>,
    ) -> Self {
        self.revenue = revenue;
        self.operating_profit = operating_profit;
        self.net_income = net_income;
        self
    }

    pub fn metric(&self, metric: Metric) -> Option<Decimal> {
        match metric {
            Metric::Revenue => self.revenue,
            Metric::OperatingProfit => self.operating_profit,
            Metric::NetIncome => self.net_income,
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: Option<Decimal>) {
        match metric {
            Metric::Revenue => self.revenue = value,
            Metric::OperatingProfit => self.operating_profit = value,
            Metric::NetIncome => self.net_income = value,
        }
    }

    /// 정렬 키 `(year, 분기 순번)`. 연간 레코드는 순번 0입니다.
    pub fn sort_key(&self) -> (i32, u8) {
        (self.year, self.quarter.map(|q| q.ordinal()).unwrap_or(0))
    }

    pub fn is_annual(&self) -> bool {
        self.quarter.is_none()
    }

    /// 표시용 기간 라벨 (`2024`, `2024 4Q`).
    pub fn label(&self) -> String {
        match self.quarter {
            Some(q) => format!("{} {}", self.year, q),
            None => self.year.to_string(),
        }
    }

    /// 세 항목이 모두 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).is_none())
    }
}

/// 저장 직전의 재무 행 (보정된 기간 + 파생 지표).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRow {
    pub period: FinancialPeriod,
    pub revenue_growth: Option<Decimal>,
    pub operating_profit_growth: Option<Decimal>,
    pub net_income_growth: Option<Decimal>,
    /// 영업이익률 (%)
    pub operating_margin: Option<Decimal>,
    /// 순이익률 (%)
    pub net_margin: Option<Decimal>,
}

impl FinancialRow {
    pub fn growth(&self, metric: Metric) -> Option<Decimal> {
        match metric {
            Metric::Revenue => self.revenue_growth,
            Metric::OperatingProfit => self.operating_profit_growth,
            Metric::NetIncome => self.net_income_growth,
        }
    }
}
