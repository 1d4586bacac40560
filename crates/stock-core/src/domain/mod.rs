//! 수집/재무 도메인 모델.

mod calculations;
mod financial;
mod time_series;

pub use calculations::*;
pub use financial::*;
pub use time_series::*;
