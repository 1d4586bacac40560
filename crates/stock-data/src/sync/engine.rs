//! 동기화 엔진.
//!
//! 한 종목(엔티티)에 대해 페이지를 순차적으로 조회합니다. N번째 페이지의
//! 연속 키가 N+1번째 요청에 들어가므로 페이지 조회는 병렬화하지 않습니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::page::{CursorPage, DatedRecord};
use crate::error::{DataError, Result};

/// 페이지 조회 상한 기본값.
pub const DEFAULT_MAX_PAGES: usize = 500;

/// 페이지 단위 데이터 소스.
#[async_trait]
pub trait PageSource: Send {
    type Record: DatedRecord + Send + Sync;

    /// 한 페이지를 조회합니다. 첫 요청은 `token == None`입니다.
    async fn fetch_page(&mut self, token: Option<&str>) -> Result<CursorPage<Self::Record>>;
}

/// upsert 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 새 행 생성
    Created,
    /// 기존 행 갱신
    Updated,
    /// 기존 행과 값이 같아 건너뜀
    Unchanged,
}

/// 유일 키 기준 저장소.
#[async_trait]
pub trait RecordSink<R: Sync>: Send {
    async fn upsert(&mut self, record: &R) -> Result<UpsertOutcome>;
}

/// 동기화 설정.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 페이지 조회 상한 (초과 시 [`DataError::PageLimitExceeded`])
    pub max_pages: usize,
    /// 페이지 한 번 조회 타임아웃
    pub fetch_timeout: Duration,
    /// 전체 조회 루프 시간 제한
    pub time_budget: Duration,
    /// 컷오프 이전 데이터를 보면 조기 종료
    pub early_stop: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            fetch_timeout: Duration::from_secs(30),
            time_budget: Duration::from_secs(600),
            early_stop: true,
        }
    }
}

impl SyncConfig {
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// 소스 정렬이 보장되지 않으면 조기 종료를 끄고 연속 키로만 종료합니다.
    pub fn with_early_stop(mut self, enabled: bool) -> Self {
        self.early_stop = enabled;
        self
    }
}

/// 조회 루프 종료 사유.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 빈 페이지 수신
    EmptyPage,
    /// 컷오프보다 오래된 데이터 도달
    PassedCutoff,
    /// 연속 조회 없음
    NoContinuation,
    /// 조회 실패 또는 타임아웃 (이전까지 수집분은 유지)
    FetchFailed(String),
    /// 최신일 모드 (첫 페이지만 조회)
    LatestOnly,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::EmptyPage => "empty_page",
            StopReason::PassedCutoff => "passed_cutoff",
            StopReason::NoContinuation => "no_continuation",
            StopReason::FetchFailed(_) => "fetch_failed",
            StopReason::LatestOnly => "latest_only",
        }
    }
}

/// 저장에 실패한 레코드.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// 수집 순서상 인덱스
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub message: String,
}

/// 조회 단계 결과.
#[derive(Debug, Clone)]
pub struct Collection<R> {
    /// 저장 대상 레코드 (조회 순서)
    pub records: Vec<R>,
    pub pages_fetched: usize,
    /// 필터링 전 전체 레코드 수
    pub fetched_records: usize,
    pub stop_reason: StopReason,
}

/// 동기화 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failures: Vec<RecordFailure>,
    pub pages_fetched: usize,
    pub fetched_records: usize,
    pub accepted_records: usize,
    pub stop_reason: StopReason,
}

impl SyncReport {
    fn from_collection<R>(collection: &Collection<R>) -> Self {
        Self {
            created: 0,
            updated: 0,
            unchanged: 0,
            failures: Vec::new(),
            pages_fetched: collection.pages_fetched,
            fetched_records: collection.fetched_records,
            accepted_records: collection.records.len(),
            stop_reason: collection.stop_reason.clone(),
        }
    }

    /// `(생성, 갱신)` 건수.
    pub fn counts(&self) -> (usize, usize) {
        (self.created, self.updated)
    }

    /// 조회 실패 없이 모든 레코드가 저장되었는지 여부.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !matches!(self.stop_reason, StopReason::FetchFailed(_))
    }

    /// 결과 요약 로그 출력
    pub fn log_summary(&self, series: &str, entity_key: &str) {
        info!(
            series = series,
            stock_code = entity_key,
            created = self.created,
            updated = self.updated,
            unchanged = self.unchanged,
            failed = self.failures.len(),
            pages = self.pages_fetched,
            fetched = self.fetched_records,
            accepted = self.accepted_records,
            stop_reason = self.stop_reason.as_str(),
            "동기화 완료"
        );
    }
}

/// 컷오프 기반 증분 동기화 엔진.
#[derive(Debug, Clone, Default)]
pub struct CursorSyncEngine {
    config: SyncConfig,
}

impl CursorSyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 컷오프 이후 레코드를 모두 조회합니다 (저장하지 않음).
    ///
    /// # 종료 조건
    /// - 빈 페이지
    /// - 조기 종료가 켜져 있고 페이지의 가장 오래된 날짜가 컷오프 이전
    /// - 연속 조회 없음 (`has_more == false` 또는 빈 키)
    /// - 조회 실패/타임아웃 (에러 대신 [`StopReason::FetchFailed`])
    ///
    /// # Errors
    /// - [`DataError::PageLimitExceeded`]: `max_pages`를 채우고도 다음 페이지가 남은 경우
    /// - [`DataError::Timeout`]: 전체 시간 제한 초과
    pub async fn collect<S: PageSource>(
        &self,
        source: &mut S,
        cutoff: NaiveDate,
    ) -> Result<Collection<S::Record>> {
        let deadline = Instant::now() + self.config.time_budget;
        let mut token: Option<String> = None;
        let mut records = Vec::new();
        let mut pages_fetched = 0usize;
        let mut fetched_records = 0usize;

        let stop_reason = loop {
            if pages_fetched >= self.config.max_pages {
                return Err(DataError::PageLimitExceeded {
                    limit: self.config.max_pages,
                });
            }

            let page = match self.fetch_with_deadline(source, token.as_deref(), deadline).await? {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = pages_fetched + 1, error = %e, "페이지 조회 실패, 수집분까지만 저장");
                    break StopReason::FetchFailed(e.to_string());
                }
            };
            pages_fetched += 1;

            if page.is_empty() {
                debug!(page = pages_fetched, "빈 페이지, 조회 종료");
                break StopReason::EmptyPage;
            }

            fetched_records += page.records.len();
            let oldest = page.oldest_date();
            let next_token = page.next_token().map(str::to_string);

            let before = records.len();
            records.extend(
                page.records
                    .into_iter()
                    .filter(|r| r.record_date().is_some_and(|d| d >= cutoff)),
            );
            debug!(
                page = pages_fetched,
                accepted = records.len() - before,
                oldest = ?oldest,
                has_next = next_token.is_some(),
                "페이지 수신"
            );

            if self.config.early_stop && oldest.is_some_and(|d| d < cutoff) {
                break StopReason::PassedCutoff;
            }

            match next_token {
                Some(next) => token = Some(next),
                None => break StopReason::NoContinuation,
            }
        };

        Ok(Collection {
            records,
            pages_fetched,
            fetched_records,
            stop_reason,
        })
    }

    /// 페이지 하나를 시간 제한 안에서 조회합니다.
    ///
    /// 바깥 `Result`는 전체 시간 제한 초과, 안쪽 `Result`는 개별 조회 실패입니다.
    async fn fetch_with_deadline<S: PageSource>(
        &self,
        source: &mut S,
        token: Option<&str>,
        deadline: Instant,
    ) -> Result<Result<CursorPage<S::Record>>> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(self.budget_exceeded());
        }

        let per_call = self.config.fetch_timeout.min(remaining);
        match tokio::time::timeout(per_call, source.fetch_page(token)).await {
            Ok(result) => Ok(result),
            Err(_) if per_call < self.config.fetch_timeout => Err(self.budget_exceeded()),
            Err(_) => Ok(Err(DataError::Timeout(format!(
                "page fetch exceeded {:?}",
                self.config.fetch_timeout
            )))),
        }
    }

    fn budget_exceeded(&self) -> DataError {
        DataError::Timeout(format!(
            "sync exceeded time budget of {:?}",
            self.config.time_budget
        ))
    }

    /// 컷오프 이후 레코드를 조회해 저장합니다.
    ///
    /// 조회가 끝난 뒤 수집 순서대로 upsert하며, 레코드 하나의 저장 실패는
    /// [`RecordFailure`]로 남기고 나머지는 계속 저장합니다.
    /// 페이지 상한 초과 시 아무것도 저장하지 않습니다.
    #[instrument(skip(self, source, sink), fields(max_pages = self.config.max_pages))]
    pub async fn sync<S, K>(&self, source: &mut S, cutoff: NaiveDate, sink: &mut K) -> Result<SyncReport>
    where
        S: PageSource,
        K: RecordSink<S::Record>,
    {
        let collection = self.collect(source, cutoff).await?;
        Ok(store(collection, sink).await)
    }

    /// 최신일 모드: 첫 페이지만 조회해 가장 최근 날짜의 레코드만 저장합니다.
    #[instrument(skip_all)]
    pub async fn sync_latest<S, K>(&self, source: &mut S, sink: &mut K) -> Result<SyncReport>
    where
        S: PageSource,
        K: RecordSink<S::Record>,
    {
        let deadline = Instant::now() + self.config.time_budget;
        let (page, stop_reason) = match self.fetch_with_deadline(source, None, deadline).await? {
            Ok(page) => (page, StopReason::LatestOnly),
            Err(e) => {
                warn!(error = %e, "최신 데이터 조회 실패");
                (CursorPage::last(Vec::new()), StopReason::FetchFailed(e.to_string()))
            }
        };

        let fetched_records = page.records.len();
        let pages_fetched = usize::from(matches!(stop_reason, StopReason::LatestOnly));
        let records = match page.latest_date() {
            Some(latest) => page
                .records
                .into_iter()
                .filter(|r| r.record_date() == Some(latest))
                .collect(),
            None => Vec::new(),
        };

        let collection = Collection {
            records,
            pages_fetched,
            fetched_records,
            stop_reason,
        };
        Ok(store(collection, sink).await)
    }
}

/// 수집된 레코드를 순서대로 upsert합니다.
async fn store<R, K>(collection: Collection<R>, sink: &mut K) -> SyncReport
where
    R: DatedRecord + Send + Sync,
    K: RecordSink<R>,
{
    let mut report = SyncReport::from_collection(&collection);

    for (index, record) in collection.records.iter().enumerate() {
        match sink.upsert(record).await {
            Ok(UpsertOutcome::Created) => report.created += 1,
            Ok(UpsertOutcome::Updated) => report.updated += 1,
            Ok(UpsertOutcome::Unchanged) => report.unchanged += 1,
            Err(e) => {
                let date = record.record_date();
                warn!(index = index, date = ?date, error = %e, "레코드 저장 실패");
                report.failures.push(RecordFailure {
                    index,
                    date,
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

/// 기본 설정으로 동기화합니다.
///
/// `report.counts()`가 `(생성, 갱신)` 건수입니다.
pub async fn sync<S, K>(source: &mut S, cutoff: NaiveDate, sink: &mut K) -> Result<SyncReport>
where
    S: PageSource,
    K: RecordSink<S::Record>,
{
    CursorSyncEngine::default().sync(source, cutoff, sink).await
}
