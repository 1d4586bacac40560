//! 연속 조회 키 기반 증분 동기화.
//!
//! 증권사 API는 최신 데이터부터 페이지 단위로 내려주며, 응답 헤더의
//! 연속 조회 키로 다음(더 오래된) 페이지를 요청합니다. 이 모듈은
//! 그 루프를 한 곳에 모읍니다:
//! - 롤링 컷오프 날짜 이전 레코드는 버림
//! - 컷오프보다 오래된 데이터가 보이면 조기 종료
//! - `(entity_key, date)` 유일 키 기준 upsert로 재실행해도 중복 없음

mod engine;
mod memory;
mod page;

pub use engine::*;
pub use memory::*;
pub use page::*;
