//! 메모리 기반 시계열 저장소.
//!
//! DB 없이 동기화 결과를 확인할 때 사용합니다 (`--dry-run`, 테스트).

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use stock_core::TimeSeriesRecord;

use super::engine::{RecordSink, UpsertOutcome};
use crate::error::Result;

/// `(entity_key, date)` 키의 메모리 저장소.
///
/// 이미 있는 키는 값이 같아도 [`UpsertOutcome::Updated`]로 보고합니다.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    rows: BTreeMap<(String, NaiveDate), TimeSeriesRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_key: &str, date: NaiveDate) -> Option<&TimeSeriesRecord> {
        self.rows.get(&(entity_key.to_string(), date))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 저장된 레코드 (키 순서).
    pub fn records(&self) -> impl Iterator<Item = &TimeSeriesRecord> {
        self.rows.values()
    }
}

#[async_trait]
impl RecordSink<TimeSeriesRecord> for MemorySink {
    async fn upsert(&mut self, record: &TimeSeriesRecord) -> Result<UpsertOutcome> {
        let key = (record.entity_key.clone(), record.date);
        match self.rows.insert(key, record.clone()) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Created),
        }
    }
}
