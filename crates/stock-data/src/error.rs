//! 데이터 계층 오류.
//!
//! 저장소(sqlx)와 외부 API(reqwest) 오류를 한 타입으로 모읍니다.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("DB 연결 실패: {0}")]
    ConnectionError(String),

    #[error("쿼리 실패: {0}")]
    QueryError(String),

    /// 고유 키 충돌 (PostgreSQL 23505)
    #[error("고유 키 충돌: {0}")]
    DuplicateError(String),

    #[error("마이그레이션 실패: {0}")]
    MigrationError(String),

    #[error("직렬화 실패: {0}")]
    SerializationError(String),

    #[error("잘못된 데이터: {0}")]
    InvalidData(String),

    #[error("설정 오류: {0}")]
    ConfigError(String),

    /// HTTP 타임아웃, 풀 대기 초과, 동기화 시간 제한 초과
    #[error("시간 초과: {0}")]
    Timeout(String),

    #[error("조회 실패: {0}")]
    FetchError(String),

    /// API가 `return_code != 0`으로 응답
    #[error("API 오류 ({code}): {message}")]
    ApiError { code: i32, message: String },

    /// 연속 조회 키가 끝나지 않음
    #[error("페이지 상한 초과: {limit}페이지를 넘었습니다")]
    PageLimitExceeded { limit: usize },
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::Timeout("connection pool".to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                DataError::DuplicateError(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            other => DataError::QueryError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else {
            DataError::FetchError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
