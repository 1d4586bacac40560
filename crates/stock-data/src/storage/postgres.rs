//! PostgreSQL 연결 풀과 종목 마스터 저장소.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::{DataError, Result};

/// 연결 풀 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 연결 획득 타임아웃
    pub acquire_timeout: Duration,
    /// 유휴 연결 정리 주기
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// 최소 연결 수는 최대 연결 수를 넘지 않도록 맞춥니다.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = self.min_connections.min(max_connections);
        self
    }
}

/// 공유 연결 풀.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!(max_connections = config.max_connections, "DB 연결 완료");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `migrations/`의 스키마를 적용합니다.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("마이그레이션 적용 완료");
        Ok(())
    }
}

/// 종목 마스터 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct StockRecord {
    pub code: String,
    pub name: String,
    pub market: String,
    pub is_active: bool,
}

/// 종목 마스터 repository.
#[derive(Clone)]
pub struct StockRepository {
    db: Database,
}

impl StockRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 활성 종목을 코드 순으로 조회합니다.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<StockRecord>> {
        let stocks = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT code, name, market, is_active
            FROM stock
            WHERE is_active
            ORDER BY code
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(stocks)
    }

    /// 지정한 코드의 종목을 조회합니다 (없는 코드는 결과에서 빠짐).
    #[instrument(skip(self), fields(count = codes.len()))]
    pub async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<StockRecord>> {
        let stocks = sqlx::query_as::<_, StockRecord>(
            r#"
            SELECT code, name, market, is_active
            FROM stock
            WHERE code = ANY($1)
            ORDER BY code
            "#,
        )
        .bind(codes)
        .fetch_all(self.db.pool())
        .await?;

        Ok(stocks)
    }
}
