//! 수집 통계 구조체.

use serde::Serialize;
use std::time::Duration;
use stock_data::SyncReport;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionStats {
    /// 총 시도 횟수 (종목 수)
    pub total: usize,
    /// 성공 횟수
    pub success: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 빈 데이터 (조회 성공, 저장할 레코드 없음)
    pub empty: usize,
    /// 생성된 레코드 수
    pub created: usize,
    /// 갱신된 레코드 수
    pub updated: usize,
    /// 값이 같아 건너뛴 레코드 수
    pub unchanged: usize,
    /// 저장 실패 레코드 수
    pub failed_records: usize,
    /// 실패 목록 (대상, 메시지)
    pub error_list: Vec<(String, String)>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 종목 하나의 동기화 결과 반영
    ///
    /// 조회 실패로 중단된 경우도 이미 받은 레코드는 저장되었으므로
    /// 성공으로 세되 실패 목록에 남깁니다.
    pub fn record_report(&mut self, target: &str, report: &SyncReport) {
        self.total += 1;
        self.created += report.created;
        self.updated += report.updated;
        self.unchanged += report.unchanged;
        self.failed_records += report.failures.len();

        if report.accepted_records == 0 {
            self.empty += 1;
        } else {
            self.success += 1;
        }

        if let stock_data::StopReason::FetchFailed(message) = &report.stop_reason {
            self.error_list
                .push((target.to_string(), format!("조회 중단: {}", message)));
        }
        if !report.failures.is_empty() {
            self.error_list.push((
                target.to_string(),
                format!("레코드 {}건 저장 실패", report.failures.len()),
            ));
        }
    }

    /// 종목 하나의 실패 반영
    pub fn record_error(&mut self, target: &str, error: impl std::fmt::Display) {
        self.total += 1;
        self.errors += 1;
        self.error_list.push((target.to_string(), error.to_string()));
    }

    /// 다른 통계를 합산
    pub fn merge(&mut self, other: &CollectionStats) {
        self.total += other.total;
        self.success += other.success;
        self.errors += other.errors;
        self.empty += other.empty;
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.failed_records += other.failed_records;
        self.error_list.extend(other.error_list.iter().cloned());
        self.elapsed += other.elapsed;
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            empty = self.empty,
            created = self.created,
            updated = self.updated,
            unchanged = self.unchanged,
            failed_records = self.failed_records,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );

        if !self.error_list.is_empty() {
            tracing::warn!(operation = operation, count = self.error_list.len(), "[실패 목록]");
            for (target, message) in &self.error_list {
                tracing::warn!(target_name = %target, "  {}", message);
            }
        }
    }
}
