//! # Stock Core
//!
//! 주식 리서치 데이터 수집기의 핵심 도메인 모델과 계산 로직을 제공합니다.
//!
//! 이 크레이트는 수집기 전반에서 사용되는 기본 타입을 제공합니다:
//! - 시계열 레코드 (종목 + 날짜 조합 유일)
//! - 재무 기간 레코드 (연간/분기)
//! - 4분기 보정 및 증가율/이익률 계산
//! - 날짜/숫자 파싱 유틸리티
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
