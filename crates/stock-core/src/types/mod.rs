//! 수집기 전반에서 사용되는 공통 타입과 파싱 유틸리티.

mod date;
mod number;

pub use date::*;
pub use number::*;
