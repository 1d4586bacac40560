//! 주식 리서치 데이터 수집기.
//!
//! 이 crate는 cron으로 실행하는 배치 수집 바이너리를 제공합니다:
//! - 키움 REST API 시계열 동기화 (일봉/주봉/월봉/투자자 동향/공매도)
//! - 일일 업데이트 (모든 시리즈 최신일 모드)
//! - 재무제표 4분기 보정 및 증가율 계산

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
