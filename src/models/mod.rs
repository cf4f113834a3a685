//! # 데이터 모델 모듈
//!
//! 요청/응답 JSON 구조체와 저장소 레코드 구조체를 정의합니다.
//! - `instance`: 인스턴스(사용자별 주간 가능 시간) 관련 구조체
//!
//! `pub use instance::*;`로 재공개하여 `crate::models::Instance`처럼 짧게 접근합니다.

pub mod instance;

pub use instance::*;
