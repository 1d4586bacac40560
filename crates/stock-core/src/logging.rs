//! 수집기 로깅 초기화.
//!
//! 수집 명령어는 구조화된 필드(series, stock_code, created, updated 등)로
//! 로그를 남깁니다. cron으로 돌릴 때는 `LOG_FORMAT=json`으로 한 줄 JSON을 남기고,
//! 터미널에서 직접 실행할 때는 pretty 형식을 씁니다.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::error::CoreError;

/// 필터 대상 crate 목록 (`--log-level` 적용 범위).
pub const COLLECTOR_TARGETS: [&str; 3] = ["stock_collector", "stock_data", "stock_core"];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    /// 한 줄 형식
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(CoreError::InvalidInput(format!("log format: {}", other))),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: `stock_data=debug`)
    pub filter: String,
    pub format: LogFormat,
    /// span 진입/종료 이벤트 출력
    pub span_events: bool,
    /// 파일명과 줄 번호 출력
    pub source_location: bool,
}

impl LogConfig {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            format: LogFormat::default(),
            span_events: false,
            source_location: false,
        }
    }

    /// 수집기 crate 전체에 같은 레벨을 적용합니다.
    ///
    /// `LogConfig::for_collector("debug").filter`는
    /// `stock_collector=debug,stock_data=debug,stock_core=debug`입니다.
    pub fn for_collector(level: &str) -> Self {
        let filter = COLLECTOR_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",");
        Self::new(filter)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.source_location = enabled;
        self
    }

    /// `LOG_FORMAT` 환경 변수로 형식을 덮어씁니다. 알 수 없는 값은 무시합니다.
    pub fn with_format_from_env(self) -> Self {
        match std::env::var("LOG_FORMAT").ok().and_then(|v| v.parse().ok()) {
            Some(format) => self.with_format(format),
            None => self,
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().with_current_span(true).boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_collector("info")
    }
}

/// 전역 subscriber를 설치합니다.
///
/// `RUST_LOG`가 있으면 `config.filter`보다 우선합니다. 이미 설치되어 있으면 에러입니다.
///
/// ```no_run
/// use stock_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::for_collector("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(env_filter)
        .try_init()?;

    tracing::debug!(format = %config.format, filter = %config.filter, "로깅 초기화 완료");
    Ok(())
}

/// 시리즈/종목 필드가 붙은 span.
#[macro_export]
macro_rules! sync_span {
    ($name:expr, $series:expr) => {
        tracing::info_span!($name, series = %$series)
    };
    ($name:expr, $series:expr, $stock_code:expr) => {
        tracing::info_span!($name, series = %$series, stock_code = %$stock_code)
    };
}
