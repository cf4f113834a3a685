//! # 비즈니스 로직 모듈
//!
//! - `week_codec`: 7자리 이진 주(week) 문자열 ↔ 10진수 변환, 저장 형식 합치기/나누기
//! - `validation`: 인스턴스 생성 요청 검증 규칙

pub mod validation;
pub mod week_codec;
