//! PostgreSQL 저장소.

pub mod financial;
pub mod postgres;
pub mod time_series;

pub use financial::{
    period_ordinal, quarter_from_ordinal, FilingSaveStats, FinancialRepository,
    FinancialSaveStats, FinancialStore,
};
pub use postgres::{Database, DatabaseConfig, StockRecord, StockRepository};
pub use time_series::TimeSeriesRepository;
