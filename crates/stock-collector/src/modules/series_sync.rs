//! 키움 시계열 동기화 모듈.
//!
//! 종목마다 [`KiwoomPageSource`]를 만들어 동기화 엔진에 넘기고,
//! 결과를 `time_series_record` 테이블에 upsert합니다. 종목 간에는
//! 설정된 딜레이만큼 쉬어 API 호출 제한을 지킵니다.

use chrono::{Local, NaiveDate};
use std::time::Instant;
use stock_core::TimeSeriesRecord;
use stock_data::{
    CursorSyncEngine, Database, KiwoomClient, KiwoomPageSource, MemorySink, RecordSink,
    SeriesKind, SyncReport, TimeSeriesRepository,
};
use tracing::{debug, error, info, Instrument};

use crate::{CollectionStats, CollectorConfig, Result};

/// 수집 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SyncMode {
    /// 컷오프까지 전체 기간
    #[default]
    All,
    /// 가장 최근 거래일 하루
    Last,
}

/// 시계열 동기화 옵션.
#[derive(Debug, Clone)]
pub struct SeriesSyncOptions {
    pub series: SeriesKind,
    pub mode: SyncMode,
    /// 전체 모드 수집 기간 (일). 없으면 시리즈 기본값
    pub days: Option<u32>,
    /// 기준일 (보통 오늘)
    pub base_date: NaiveDate,
    /// DB에 쓰지 않고 결과만 확인
    pub dry_run: bool,
}

impl SeriesSyncOptions {
    pub fn new(series: SeriesKind, mode: SyncMode) -> Self {
        Self {
            series,
            mode,
            days: None,
            base_date: Local::now().date_naive(),
            dry_run: false,
        }
    }

    pub fn with_days(mut self, days: Option<u32>) -> Self {
        self.days = days;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 전체 모드 컷오프.
    pub fn cutoff(&self) -> NaiveDate {
        self.series.cutoff(self.base_date, self.days)
    }
}

/// 종목 목록에 대해 시리즈 하나를 동기화합니다.
pub async fn sync_series(
    db: &Database,
    config: &CollectorConfig,
    options: &SeriesSyncOptions,
    codes: &[String],
) -> Result<CollectionStats> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();

    let client = KiwoomClient::new(config.kiwoom.client_config()?)?;
    let engine = CursorSyncEngine::new(config.series_sync.engine_config());
    let series = options.series;

    info!(
        series = %series,
        mode = ?options.mode,
        stocks = codes.len(),
        cutoff = %options.cutoff(),
        dry_run = options.dry_run,
        "시계열 동기화 시작"
    );

    let mut repository = TimeSeriesRepository::new(db.clone(), series.as_str());
    let mut dry_run_sink = MemorySink::new();

    for (idx, code) in codes.iter().enumerate() {
        debug!(
            stock_code = %code,
            progress = format!("{}/{}", idx + 1, codes.len()),
            "수집 시작"
        );

        let span = stock_core::sync_span!("sync_series", series, code);
        let result = if options.dry_run {
            sync_stock(&engine, &client, options, code, &mut dry_run_sink)
                .instrument(span)
                .await
        } else {
            sync_stock(&engine, &client, options, code, &mut repository)
                .instrument(span)
                .await
        };

        match result {
            Ok(report) => {
                report.log_summary(series.as_str(), code);
                stats.record_report(code, &report);
            }
            Err(e) => {
                error!(series = %series, stock_code = %code, error = %e, "동기화 실패");
                stats.record_error(code, e);
            }
        }

        // Rate limiting
        if idx + 1 < codes.len() {
            tokio::time::sleep(config.series_sync.request_delay()).await;
        }
    }

    if options.dry_run {
        info!(records = dry_run_sink.len(), "dry-run: DB에 저장하지 않음");
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

async fn sync_stock<K>(
    engine: &CursorSyncEngine,
    client: &KiwoomClient,
    options: &SeriesSyncOptions,
    code: &str,
    sink: &mut K,
) -> stock_data::Result<SyncReport>
where
    K: RecordSink<TimeSeriesRecord>,
{
    match options.mode {
        SyncMode::All => {
            let cutoff = options.cutoff();
            let mut source =
                KiwoomPageSource::new(client.clone(), options.series, code, options.base_date, cutoff);
            engine.sync(&mut source, cutoff, sink).await
        }
        SyncMode::Last => {
            let mut source =
                KiwoomPageSource::latest(client.clone(), options.series, code, options.base_date);
            engine.sync_latest(&mut source, sink).await
        }
    }
}

/// 일일 업데이트: 모든 시리즈를 최신일 모드로 순차 실행합니다.
///
/// 시리즈 하나가 실패해도 나머지는 계속 실행하고 마지막에 실패 목록을 남깁니다.
pub async fn run_daily(
    db: &Database,
    config: &CollectorConfig,
    codes: &[String],
) -> Result<CollectionStats> {
    let mut total = CollectionStats::new();
    let series_count = SeriesKind::ALL.len();

    info!(series = series_count, stocks = codes.len(), "일일 업데이트 시작");

    for (idx, series) in SeriesKind::ALL.into_iter().enumerate() {
        info!("[{}/{}] {}", idx + 1, series_count, series);
        let options = SeriesSyncOptions::new(series, SyncMode::Last);

        match sync_series(db, config, &options, codes).await {
            Ok(stats) => {
                stats.log_summary(series.as_str());
                total.merge(&stats);
            }
            Err(e) => {
                error!(series = %series, error = %e, "시리즈 실패");
                total.error_list.push((series.to_string(), e.to_string()));
                total.errors += 1;
            }
        }
    }

    Ok(total)
}
