//! 환경변수 기반 설정 모듈.

use secrecy::SecretString;
use std::time::Duration;
use stock_data::{DatabaseConfig, KiwoomConfig, SyncConfig};

use crate::error::CollectorError;
use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// DB 최대 연결 수
    pub db_max_connections: u32,
    /// 키움 API 설정
    pub kiwoom: KiwoomSettings,
    /// 시계열 동기화 설정
    pub series_sync: SeriesSyncConfig,
}

/// 키움 API 설정
#[derive(Debug, Clone)]
pub struct KiwoomSettings {
    /// API 기본 URL
    pub base_url: String,
    /// 접근 토큰 (재무 보정만 실행할 때는 없어도 됨)
    pub access_token: Option<SecretString>,
    /// HTTP 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
}

/// 시계열 동기화 설정
#[derive(Debug, Clone)]
pub struct SeriesSyncConfig {
    /// 종목당 최대 페이지 수
    pub max_pages: usize,
    /// 페이지 한 번 조회 타임아웃 (초)
    pub fetch_timeout_secs: u64,
    /// 종목당 전체 조회 시간 제한 (초)
    pub time_budget_secs: u64,
    /// 종목 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키-값 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            CollectorError::Config("DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })?;

        let access_token = lookup("KIWOOM_ACCESS_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        Ok(Self {
            database_url,
            db_max_connections: var_parse(&lookup, "DB_MAX_CONNECTIONS", DatabaseConfig::DEFAULT_MAX_CONNECTIONS),
            kiwoom: KiwoomSettings {
                base_url: lookup("KIWOOM_BASE_URL")
                    .unwrap_or_else(|| KiwoomConfig::DEFAULT_BASE_URL.to_string()),
                access_token,
                http_timeout_secs: var_parse(&lookup, "KIWOOM_HTTP_TIMEOUT_SECS", 30),
            },
            series_sync: SeriesSyncConfig {
                max_pages: var_parse(&lookup, "SYNC_MAX_PAGES", stock_data::sync::DEFAULT_MAX_PAGES),
                fetch_timeout_secs: var_parse(&lookup, "SYNC_FETCH_TIMEOUT_SECS", 30),
                time_budget_secs: var_parse(&lookup, "SYNC_TIME_BUDGET_SECS", 600),
                request_delay_ms: var_parse(&lookup, "SYNC_REQUEST_DELAY_MS", 300),
            },
        })
    }

    /// DB 연결 설정
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone()).with_max_connections(self.db_max_connections)
    }
}

impl KiwoomSettings {
    /// 키움 클라이언트 설정 (토큰 필수)
    pub fn client_config(&self) -> Result<KiwoomConfig> {
        let token = self.access_token.clone().ok_or_else(|| {
            CollectorError::Config("KIWOOM_ACCESS_TOKEN 환경변수가 설정되지 않았습니다".to_string())
        })?;
        Ok(KiwoomConfig::new(token)
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.http_timeout_secs)))
    }
}

impl SeriesSyncConfig {
    /// 동기화 엔진 설정
    pub fn engine_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_max_pages(self.max_pages)
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .with_time_budget(Duration::from_secs(self.time_budget_secs))
    }

    /// 종목 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// 값을 파싱 (없거나 실패 시 기본값 사용)
fn var_parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
