//! 도메인 에러 타입.
//!
//! 도메인 값 파싱/검증 과정에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 알 수 없는 분기
    #[error("알 수 없는 분기: {0}")]
    InvalidQuarter(String),
}
