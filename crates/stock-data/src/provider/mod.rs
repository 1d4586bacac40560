//! 외부 데이터 Provider.
//!
//! - 키움 REST API 클라이언트와 [`PageSource`](crate::sync::PageSource) 어댑터
//! - 시리즈 카탈로그 (API ID, 요청 본문, 필드 매핑)

pub mod kiwoom;
pub mod series;

pub use kiwoom::{row_to_record, KiwoomClient, KiwoomConfig, KiwoomPageSource, KiwoomResponse};
pub use series::SeriesKind;
