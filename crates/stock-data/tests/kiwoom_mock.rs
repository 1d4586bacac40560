//! 키움 REST API 모의 서버 테스트
//!
//! 응답 헤더의 `cont-yn`/`next-key`가 다음 요청으로 이어지는지,
//! 오류 응답이 부분 결과로 처리되는지 확인합니다.

use chrono::NaiveDate;
use mockito::Matcher;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::json;
use stock_data::{
    CursorSyncEngine, DataError, KiwoomClient, KiwoomConfig, KiwoomPageSource, MemorySink,
    PageSource, SeriesKind, StopReason,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn client(base_url: &str) -> KiwoomClient {
    let config = KiwoomConfig::new(SecretString::from("test-token".to_string())).with_base_url(base_url);
    KiwoomClient::new(config).unwrap()
}

fn weekly_rows(dates: &[&str]) -> String {
    let rows: Vec<_> = dates
        .iter()
        .map(|dt| {
            json!({
                "dt": dt,
                "cur_prc": "+71,000",
                "open_pric": "70500",
                "high_pric": "71500",
                "low_pric": "70000",
                "pred_pre": "+600",
                "trde_qty": "1,234",
                "trde_prica": "87614"
            })
        })
        .collect();
    json!({
        "return_code": 0,
        "return_msg": "정상적으로 처리되었습니다",
        "stk_stk_pole_chart_qry": rows
    })
    .to_string()
}

#[tokio::test]
async fn test_continuation_headers_drive_paging() {
    let mut server = mockito::Server::new_async().await;

    let first = server
        .mock("POST", "/api/dostk/chart")
        .match_header("api-id", "ka10082")
        .match_header("authorization", "Bearer test-token")
        .match_header("cont-yn", "N")
        .match_body(Matcher::PartialJson(json!({"stk_cd": "005930", "upd_stkpc_tp": "1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("cont-yn", "Y")
        .with_header("next-key", "20240105")
        .with_body(weekly_rows(&["20240110", "20240105"]))
        .create_async()
        .await;

    let second = server
        .mock("POST", "/api/dostk/chart")
        .match_header("cont-yn", "Y")
        .match_header("next-key", "20240105")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("cont-yn", "N")
        .with_body(weekly_rows(&["20240101", "20231228"]))
        .create_async()
        .await;

    let mut source = KiwoomPageSource::new(
        client(&server.url()),
        SeriesKind::WeeklyChart,
        "005930",
        date(2024, 1, 12),
        date(2024, 1, 1),
    );
    let mut sink = MemorySink::new();

    let report = CursorSyncEngine::default()
        .sync(&mut source, date(2024, 1, 1), &mut sink)
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;

    assert_eq!(report.counts(), (3, 0));
    assert_eq!(report.pages_fetched, 2);
    let record = sink.get("005930", date(2024, 1, 10)).unwrap();
    assert_eq!(record.field("closing_price"), Some(dec!(71000)));
    assert_eq!(record.field("trading_volume"), Some(dec!(1234)));
}

#[tokio::test]
async fn test_http_error_keeps_earlier_pages() {
    let mut server = mockito::Server::new_async().await;

    let _first = server
        .mock("POST", "/api/dostk/chart")
        .match_header("cont-yn", "N")
        .with_status(200)
        .with_header("cont-yn", "Y")
        .with_header("next-key", "k1")
        .with_body(weekly_rows(&["20240110"]))
        .create_async()
        .await;

    let _second = server
        .mock("POST", "/api/dostk/chart")
        .match_header("cont-yn", "Y")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let mut source = KiwoomPageSource::new(
        client(&server.url()),
        SeriesKind::WeeklyChart,
        "005930",
        date(2024, 1, 12),
        date(2024, 1, 1),
    );
    let mut sink = MemorySink::new();

    let report = CursorSyncEngine::default()
        .sync(&mut source, date(2024, 1, 1), &mut sink)
        .await
        .unwrap();

    assert_eq!(report.counts(), (1, 0));
    assert!(matches!(report.stop_reason, StopReason::FetchFailed(_)));
}

#[tokio::test]
async fn test_api_error_code_is_reported() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/dostk/shsa")
        .match_header("api-id", "ka10014")
        .with_status(200)
        .with_body(json!({"return_code": 3, "return_msg": "token expired"}).to_string())
        .create_async()
        .await;

    let mut source = KiwoomPageSource::latest(
        client(&server.url()),
        SeriesKind::ShortSelling,
        "005930",
        date(2024, 1, 12),
    );

    let result = source.fetch_page(None).await;
    match result {
        Err(DataError::ApiError { code, message }) => {
            assert_eq!(code, 3);
            assert_eq!(message, "token expired");
        }
        other => panic!("unexpected result: {:?}", other.map(|p| p.records.len())),
    }
}

#[tokio::test]
async fn test_latest_mode_requests_single_page() {
    let mut server = mockito::Server::new_async().await;

    let body = json!({
        "return_code": 0,
        "stk_invsr_orgn": [
            {"dt": "20240111", "ind_invsr": "-1,200", "frgnr_invsr": "+800", "orgn": "400"},
            {"dt": "20240110", "ind_invsr": "300", "frgnr_invsr": "-100", "orgn": "-200"}
        ]
    });

    let mock = server
        .mock("POST", "/api/dostk/stkinfo")
        .match_header("api-id", "ka10059")
        .match_body(Matcher::PartialJson(json!({"dt": "20240112", "unit_tp": "1000"})))
        .with_status(200)
        .with_header("cont-yn", "Y")
        .with_header("next-key", "k1")
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await;

    let mut source = KiwoomPageSource::latest(
        client(&server.url()),
        SeriesKind::InvestorTrend,
        "005930",
        date(2024, 1, 12),
    );
    let mut sink = MemorySink::new();

    let report = CursorSyncEngine::default()
        .sync_latest(&mut source, &mut sink)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(report.counts(), (1, 0));
    let record = sink.get("005930", date(2024, 1, 11)).unwrap();
    assert_eq!(record.field("individual"), Some(dec!(-1200)));
    assert_eq!(record.field("foreign"), Some(dec!(800)));
    // 응답에 없는 필드는 0
    assert_eq!(record.field("bank"), Some(dec!(0)));
}
