//! 주식 리서치 데이터 수집 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stock_collector::modules::{
    self, FinancialScope, FinancialSyncOptions, SeriesSyncOptions, SyncMode,
};
use stock_collector::CollectorConfig;
use stock_core::{init_logging, LogConfig};
use stock_data::{Database, SeriesKind};

#[derive(Parser)]
#[command(name = "stock-collector")]
#[command(about = "Kiwoom time series sync and financial reconciliation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 시계열 하나를 동기화 (daily, weekly, monthly, investor, short)
    SyncSeries {
        /// 대상 시리즈
        #[arg(long)]
        series: SeriesKind,

        /// 특정 종목만 수집 (쉼표로 구분, 예: "005930,000660", 기본값: 활성 종목 전체)
        #[arg(long)]
        code: Option<String>,

        /// 수집 모드
        #[arg(long, value_enum, default_value_t = SyncMode::All)]
        mode: SyncMode,

        /// 전체 모드 수집 기간 (일)
        #[arg(long)]
        days: Option<u32>,

        /// DB에 저장하지 않고 조회만 실행
        #[arg(long)]
        dry_run: bool,
    },

    /// 일일 업데이트: 모든 시리즈를 최신일 모드로 실행
    RunDaily {
        /// 특정 종목만 수집 (쉼표로 구분)
        #[arg(long)]
        code: Option<String>,
    },

    /// 재무제표 4분기 보정 및 증가율 계산
    ReconcileFinancials {
        /// 특정 종목만 처리 (쉼표로 구분)
        #[arg(long)]
        code: Option<String>,

        /// 저장 범위
        #[arg(long, value_enum, default_value_t = FinancialScope::All)]
        scope: FinancialScope,

        /// 공시 원본 JSON 파일 (먼저 financial_filing에 저장)
        #[arg(long)]
        input: Option<PathBuf>,

        /// 기존 보정 결과 삭제 후 다시 계산
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    init_logging(LogConfig::for_collector(&cli.log_level).with_format_from_env())
        .map_err(|e| anyhow::anyhow!(e))
        .context("로깅 초기화 실패")?;

    tracing::info!("Stock Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(
        max_pages = config.series_sync.max_pages,
        request_delay_ms = config.series_sync.request_delay_ms,
        "설정 로드 완료"
    );

    // DB 연결
    let db = Database::connect(&config.database()).await?;
    db.migrate().await?;

    // 명령 실행
    match cli.command {
        Commands::SyncSeries {
            series,
            code,
            mode,
            days,
            dry_run,
        } => {
            let codes = modules::resolve_stock_codes(&db, code.as_deref()).await?;
            let options = SeriesSyncOptions::new(series, mode)
                .with_days(days)
                .with_dry_run(dry_run);
            let stats = modules::sync_series(&db, &config, &options, &codes).await?;
            stats.log_summary(&format!("{} 동기화", series));
        }
        Commands::RunDaily { code } => {
            tracing::info!("=== 일일 업데이트 시작 ===");
            let codes = modules::resolve_stock_codes(&db, code.as_deref()).await?;
            let stats = modules::run_daily(&db, &config, &codes).await?;
            stats.log_summary("일일 업데이트");
            tracing::info!("=== 일일 업데이트 완료 ===");
        }
        Commands::ReconcileFinancials {
            code,
            scope,
            input,
            clear,
        } => {
            let codes = modules::resolve_stock_codes(&db, code.as_deref()).await?;
            let options = FinancialSyncOptions {
                scope,
                input,
                clear,
            };
            let stats = modules::reconcile_financials(&db, &codes, &options).await?;
            stats.log_summary("재무 보정");
        }
    }

    db.pool().close().await;
    tracing::info!("Stock Collector 종료");

    Ok(())
}
