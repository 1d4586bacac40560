//! 시계열 레코드 저장소.

use async_trait::async_trait;
use sqlx::types::Json;
use stock_core::TimeSeriesRecord;
use tracing::instrument;

use super::postgres::Database;
use crate::error::Result;
use crate::sync::{RecordSink, UpsertOutcome};

/// 시리즈 하나의 `time_series_record` repository.
///
/// `(series, entity_key, date)` 기준 upsert이며 기존 행은 값이 같아도
/// 갱신으로 보고합니다.
#[derive(Clone)]
pub struct TimeSeriesRepository {
    db: Database,
    series: String,
}

impl TimeSeriesRepository {
    pub fn new(db: Database, series: impl Into<String>) -> Self {
        Self {
            db,
            series: series.into(),
        }
    }

    /// 레코드를 저장합니다.
    #[instrument(skip(self, record), fields(series = %self.series, stock_code = %record.entity_key, date = %record.date))]
    pub async fn save(&self, record: &TimeSeriesRecord) -> Result<UpsertOutcome> {
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO time_series_record (series, entity_key, date, fields)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (series, entity_key, date) DO UPDATE SET
                fields = EXCLUDED.fields,
                updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&self.series)
        .bind(&record.entity_key)
        .bind(record.date)
        .bind(Json(&record.fields))
        .fetch_one(self.db.pool())
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }
}

#[async_trait]
impl RecordSink<TimeSeriesRecord> for TimeSeriesRepository {
    async fn upsert(&mut self, record: &TimeSeriesRecord) -> Result<UpsertOutcome> {
        self.save(record).await
    }
}
