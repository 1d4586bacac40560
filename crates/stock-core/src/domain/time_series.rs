//! 종목별 일자 단위 시계열 레코드.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 시계열 레코드.
///
/// 하나의 시리즈 안에서 `(entity_key, date)` 조합은 유일합니다.
/// 같은 조합을 다시 수집하면 행을 추가하지 않고 `fields`를 덮어씁니다
/// (예: 장중 잠정치가 장 마감 후 확정치로 바뀌는 경우).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    /// 종목코드 또는 업종/테마 코드
    pub entity_key: String,
    /// 기준일
    pub date: NaiveDate,
    /// 컬럼명 → 값
    pub fields: BTreeMap<String, Decimal>,
}

impl TimeSeriesRecord {
    /// 빈 필드로 새 레코드를 생성합니다.
    pub fn new(entity_key: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            entity_key: entity_key.into(),
            date,
            fields: BTreeMap::new(),
        }
    }

    /// 필드를 추가한 레코드를 반환합니다.
    pub fn with_field(mut self, name: impl Into<String>, value: Decimal) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// 필드 값 조회.
    pub fn field(&self, name: &str) -> Option<Decimal> {
        self.fields.get(name).copied()
    }

    /// 유일 키 `(entity_key, date)`.
    pub fn key(&self) -> (&str, NaiveDate) {
        (&self.entity_key, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_and_key() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let record = TimeSeriesRecord::new("005930", date)
            .with_field("closing_price", dec!(73400))
            .with_field("trading_volume", dec!(1200000));

        assert_eq!(record.key(), ("005930", date));
        assert_eq!(record.field("closing_price"), Some(dec!(73400)));
        assert_eq!(record.field("opening_price"), None);
    }
}
