//! 데이터 수집 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 연속 조회 키 기반 증분 동기화 엔진 (롤링 컷오프 + 조기 종료)
//! - 키움 REST API 페이지 소스와 시리즈 카탈로그
//! - PostgreSQL 저장소 (시계열, 재무)

pub mod error;
pub mod provider;
pub mod storage;
pub mod sync;

pub use error::{DataError, Result};

// 동기화 엔진 재내보내기
pub use sync::{
    sync, Continuation, CursorPage, CursorSyncEngine, DatedRecord, MemorySink, PageSource,
    RecordFailure, RecordSink, StopReason, SyncConfig, SyncReport, UpsertOutcome,
};

// Provider 재내보내기
pub use provider::{KiwoomClient, KiwoomConfig, KiwoomPageSource, SeriesKind};

// 저장소 타입 재내보내기
pub use storage::{
    Database, DatabaseConfig, FilingSaveStats, FinancialRepository, FinancialSaveStats,
    FinancialStore, StockRecord, StockRepository, TimeSeriesRepository,
};
