//! 데이터 수집 모듈.

pub mod financial_sync;
pub mod series_sync;
pub mod targets;

pub use financial_sync::{
    reconcile_financials, reconcile_with_store, FinancialScope, FinancialSyncOptions,
};
pub use series_sync::{run_daily, sync_series, SeriesSyncOptions, SyncMode};
pub use targets::{parse_code_list, resolve_stock_codes};
