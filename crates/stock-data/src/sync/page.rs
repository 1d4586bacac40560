//! 한 번의 조회 결과 (레코드 + 연속 조회 정보).

use chrono::NaiveDate;
use stock_core::TimeSeriesRecord;

/// 기준일을 가진 레코드.
///
/// 동기화 엔진은 레코드의 날짜만 해석합니다. 날짜가 없으면 `None`을
/// 반환하며, 이런 레코드는 수집 대상에서 제외됩니다.
pub trait DatedRecord {
    fn record_date(&self) -> Option<NaiveDate>;
}

impl DatedRecord for TimeSeriesRecord {
    fn record_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}

/// 연속 조회 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// 다음 페이지 존재 여부 (`cont-yn == "Y"`)
    pub has_more: bool,
    /// 다음 페이지 요청에 사용할 키 (`next-key`)
    pub token: String,
}

impl Continuation {
    pub fn new(has_more: bool, token: impl Into<String>) -> Self {
        Self {
            has_more,
            token: token.into(),
        }
    }
}

/// 페이지 조회 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPage<R> {
    pub records: Vec<R>,
    pub continuation: Option<Continuation>,
}

impl<R> CursorPage<R> {
    pub fn new(records: Vec<R>, continuation: Option<Continuation>) -> Self {
        Self {
            records,
            continuation,
        }
    }

    /// 연속 조회가 없는 마지막 페이지.
    pub fn last(records: Vec<R>) -> Self {
        Self::new(records, None)
    }

    /// 다음 페이지가 있는 페이지.
    pub fn with_next(records: Vec<R>, token: impl Into<String>) -> Self {
        Self::new(records, Some(Continuation::new(true, token)))
    }

    /// 다음 페이지 요청 키.
    ///
    /// `has_more`가 참이고 키가 비어 있지 않을 때만 `Some`입니다.
    pub fn next_token(&self) -> Option<&str> {
        self.continuation
            .as_ref()
            .filter(|c| c.has_more)
            .map(|c| c.token.trim())
            .filter(|token| !token.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: DatedRecord> CursorPage<R> {
    /// 페이지 내 가장 오래된 날짜 (날짜 없는 레코드 제외).
    pub fn oldest_date(&self) -> Option<NaiveDate> {
        self.records.iter().filter_map(|r| r.record_date()).min()
    }

    /// 페이지 내 가장 최근 날짜 (날짜 없는 레코드 제외).
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().filter_map(|r| r.record_date()).max()
    }
}
