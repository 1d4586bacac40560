//! 키움증권 REST API 클라이언트.
//!
//! 모든 조회는 `POST {base_url}/api/dostk/{endpoint}`이며 `api-id` 헤더로
//! TR을 구분합니다. 연속 조회는 응답 헤더 `cont-yn`/`next-key`로 받고,
//! 다음 요청 헤더에 그대로 돌려줍니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use stock_core::{parse_compact_date, parse_signed_number, TimeSeriesRecord};
use tracing::{debug, error};

use super::series::SeriesKind;
use crate::error::{DataError, Result};
use crate::sync::{Continuation, CursorPage, PageSource};

/// 키움 REST API 설정.
#[derive(Debug, Clone)]
pub struct KiwoomConfig {
    /// API 기본 URL
    pub base_url: String,
    /// 발급된 접근 토큰
    pub access_token: SecretString,
    /// HTTP 요청 타임아웃
    pub timeout: Duration,
}

impl KiwoomConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.kiwoom.com";

    pub fn new(access_token: SecretString) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            access_token,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// 키움 API 응답 (본문 + 연속 조회 헤더).
#[derive(Debug, Clone)]
pub struct KiwoomResponse {
    pub body: Value,
    pub continuation: Option<Continuation>,
}

impl KiwoomResponse {
    /// 후보 키 중 처음 발견된 배열을 반환합니다. 없으면 빈 슬라이스.
    pub fn rows(&self, data_keys: &[&str]) -> &[Value] {
        data_keys
            .iter()
            .find_map(|key| self.body.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// 키움 REST API 클라이언트.
#[derive(Clone)]
pub struct KiwoomClient {
    client: Client,
    config: KiwoomConfig,
}

impl KiwoomClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: KiwoomConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP client build failed: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &KiwoomConfig {
        &self.config
    }

    fn build_headers(&self, api_id: &str, next_key: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=UTF-8"),
        );

        let bearer = format!("Bearer {}", self.config.access_token.expose_secret());
        let mut authorization = HeaderValue::from_str(&bearer).map_err(|_| {
            DataError::ConfigError("access token에 유효하지 않은 문자 포함".to_string())
        })?;
        authorization.set_sensitive(true);
        headers.insert("authorization", authorization);

        headers.insert(
            "api-id",
            HeaderValue::from_str(api_id)
                .map_err(|_| DataError::ConfigError(format!("잘못된 api-id: {}", api_id)))?,
        );

        let (cont_yn, key) = match next_key {
            Some(key) => ("Y", key),
            None => ("N", ""),
        };
        headers.insert("cont-yn", HeaderValue::from_static(cont_yn));
        headers.insert(
            "next-key",
            HeaderValue::from_str(key)
                .map_err(|_| DataError::InvalidData(format!("잘못된 next-key: {}", key)))?,
        );

        Ok(headers)
    }

    /// TR 하나를 호출합니다.
    ///
    /// HTTP 오류와 `return_code != 0` 응답은 [`DataError::ApiError`]입니다.
    pub async fn post(
        &self,
        endpoint: &str,
        api_id: &str,
        body: &Value,
        next_key: Option<&str>,
    ) -> Result<KiwoomResponse> {
        let url = format!("{}/api/dostk/{}", self.config.base_url, endpoint);
        let headers = self.build_headers(api_id, next_key)?;

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let continuation = continuation_from_headers(response.headers());
        let text = response.text().await?;

        if !status.is_success() {
            error!(api_id = api_id, status = %status, "Kiwoom API 호출 실패");
            return Err(DataError::ApiError {
                code: i32::from(status.as_u16()),
                message: text,
            });
        }

        let body: Value = serde_json::from_str(&text)?;
        if let Some(code) = body.get("return_code").and_then(Value::as_i64) {
            if code != 0 {
                let message = body
                    .get("return_msg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return Err(DataError::ApiError {
                    code: i32::try_from(code).unwrap_or(-1),
                    message,
                });
            }
        }

        Ok(KiwoomResponse { body, continuation })
    }
}

/// 응답 헤더에서 연속 조회 정보를 읽습니다.
///
/// `cont-yn == "Y"`이고 `next-key`가 비어 있지 않을 때만 다음 페이지가 있습니다.
fn continuation_from_headers(headers: &HeaderMap) -> Option<Continuation> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };

    let token = header("next-key");
    let has_more = header("cont-yn").eq_ignore_ascii_case("Y") && !token.is_empty();
    has_more.then(|| Continuation::new(true, token))
}

/// 응답 행 하나를 시계열 레코드로 변환합니다.
///
/// `dt`가 없거나 잘못된 행은 `None`입니다. 숫자 필드는 쉼표와 `+` 기호를
/// 제거해 파싱하며, 값이 없으면 0으로 저장합니다.
pub fn row_to_record(series: SeriesKind, stock_code: &str, row: &Value) -> Option<TimeSeriesRecord> {
    let date = row.get("dt").and_then(Value::as_str).and_then(parse_compact_date)?;

    let record = series
        .field_mappings()
        .iter()
        .fold(TimeSeriesRecord::new(stock_code, date), |record, (source, column)| {
            let value = match row.get(*source) {
                Some(Value::String(s)) => parse_signed_number(s),
                Some(Value::Number(n)) => parse_signed_number(&n.to_string()),
                _ => parse_signed_number(""),
            };
            record.with_field(*column, value)
        });
    Some(record)
}

/// 종목 하나의 시리즈 조회를 [`PageSource`]로 감싼 어댑터.
pub struct KiwoomPageSource {
    client: KiwoomClient,
    series: SeriesKind,
    stock_code: String,
    body: Value,
}

impl KiwoomPageSource {
    /// 전체 모드 소스 (`start`는 컷오프).
    pub fn new(
        client: KiwoomClient,
        series: SeriesKind,
        stock_code: impl Into<String>,
        base: NaiveDate,
        start: NaiveDate,
    ) -> Self {
        let stock_code = stock_code.into();
        let body = series.request_body(&stock_code, base, start);
        Self {
            client,
            series,
            stock_code,
            body,
        }
    }

    /// 최신일 모드 소스.
    pub fn latest(
        client: KiwoomClient,
        series: SeriesKind,
        stock_code: impl Into<String>,
        base: NaiveDate,
    ) -> Self {
        let start = series.latest_start(base);
        Self::new(client, series, stock_code, base, start)
    }

    pub fn series(&self) -> SeriesKind {
        self.series
    }

    pub fn stock_code(&self) -> &str {
        &self.stock_code
    }
}

#[async_trait]
impl PageSource for KiwoomPageSource {
    type Record = TimeSeriesRecord;

    async fn fetch_page(&mut self, token: Option<&str>) -> Result<CursorPage<TimeSeriesRecord>> {
        let response = self
            .client
            .post(self.series.endpoint(), self.series.api_id(), &self.body, token)
            .await?;

        let rows = response.rows(self.series.data_keys());
        let records: Vec<TimeSeriesRecord> = rows
            .iter()
            .filter_map(|row| row_to_record(self.series, &self.stock_code, row))
            .collect();

        if records.len() < rows.len() {
            debug!(
                series = %self.series,
                stock_code = %self.stock_code,
                dropped = rows.len() - records.len(),
                "날짜 없는 행 제외"
            );
        }

        // 날짜 있는 행이 하나도 없으면 빈 페이지로 취급되어 조회가 끝남
        Ok(CursorPage::new(records, response.continuation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_row_to_record_chart() {
        let row = json!({
            "dt": "20250905",
            "cur_prc": "+71,000",
            "open_pric": "-70500",
            "high_pric": "71500",
            "low_pric": "70000",
            "pred_pre": "+600",
            "trde_qty": "12,345,678",
            "trde_prica": ""
        });

        let record = row_to_record(SeriesKind::WeeklyChart, "005930", &row).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 9, 5).unwrap());
        assert_eq!(record.field("closing_price"), Some(dec!(71000)));
        assert_eq!(record.field("opening_price"), Some(dec!(-70500)));
        assert_eq!(record.field("price_change"), Some(dec!(600)));
        assert_eq!(record.field("trading_volume"), Some(dec!(12345678)));
        assert_eq!(record.field("trading_value"), Some(dec!(0)));
    }

    #[test]
    fn test_row_without_date_is_dropped() {
        let row = json!({"cur_prc": "100"});
        assert!(row_to_record(SeriesKind::DailyChart, "005930", &row).is_none());

        let row = json!({"dt": "2025-09-05", "cur_prc": "100"});
        assert!(row_to_record(SeriesKind::DailyChart, "005930", &row).is_none());
    }

    #[test]
    fn test_response_rows_uses_first_array_key() {
        let response = KiwoomResponse {
            body: json!({"return_code": 0, "chart": "x", "data": [{"dt": "20250905"}]}),
            continuation: None,
        };
        assert_eq!(response.rows(SeriesKind::DailyChart.data_keys()).len(), 1);

        let response = KiwoomResponse {
            body: json!({"return_code": 0}),
            continuation: None,
        };
        assert!(response.rows(SeriesKind::DailyChart.data_keys()).is_empty());
    }

    #[test]
    fn test_continuation_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("cont-yn", HeaderValue::from_static("Y"));
        headers.insert("next-key", HeaderValue::from_static("20250801"));
        assert_eq!(
            continuation_from_headers(&headers),
            Some(Continuation::new(true, "20250801"))
        );

        headers.insert("next-key", HeaderValue::from_static(""));
        assert_eq!(continuation_from_headers(&headers), None);

        headers.insert("cont-yn", HeaderValue::from_static("N"));
        headers.insert("next-key", HeaderValue::from_static("20250801"));
        assert_eq!(continuation_from_headers(&headers), None);
    }
}
