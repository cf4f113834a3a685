//! # 에러 처리 모듈
//!
//! 요청 처리 중 발생할 수 있는 모든 에러 타입을 정의합니다.
//! Rust에서는 예외(exception) 대신 `Result<T, E>` 타입으로 에러를 처리합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 모든 에러는 발생한 요청 안에서 바로 HTTP 응답으로 바뀌며, 재시도는 없습니다.

use axum::{
    http::StatusCode,                   // HTTP 상태 코드 (200, 404, 500 등)
    response::{IntoResponse, Response}, // Axum의 응답 변환 트레이트
    Json,                               // JSON 응답 래퍼
};
use serde_json::json; // json! 매크로: JSON 객체를 간편하게 생성
use thiserror::Error;

use crate::services::week_codec::CodecError;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청 본문 JSON 파싱 실패 (HTTP 400)
    /// 파서의 에러 메시지를 그대로 전달합니다.
    #[error("{0}")]
    BadRequest(String),

    /// username 또는 binaryWeeks가 비어 있음 (HTTP 400)
    #[error("Missing required fields")]
    MissingFields,

    /// 주(week) 문자열이 7자리 이진 형식이 아님 (HTTP 400)
    /// #[from]: CodecError → AppError 자동 변환 (`?` 사용 가능)
    #[error("Invalid data: {0}")]
    InvalidFormat(#[from] CodecError),

    /// 같은 instanceId에 같은 username이 이미 있음 (HTTP 400)
    #[error("Username already exists for this instance")]
    DuplicateUsername,

    /// 삭제할 레코드가 없음 (HTTP 404)
    #[error("No records found to delete")]
    NotFound,

    /// 저장소 호출이 제한 시간을 넘김 (HTTP 500)
    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(std::time::Duration),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx::Error → AppError::Database 자동 변환
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// 응답 본문에 들어가는 기계용 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::MissingFields => "missing_fields",
            AppError::InvalidFormat(_) => "invalid_format",
            AppError::DuplicateUsername => "duplicate_username",
            AppError::NotFound => "not_found",
            AppError::StoreTimeout(_) => "store_timeout",
            AppError::Internal(_) => "internal_error",
            AppError::Database(_) => "database_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::MissingFields
            | AppError::InvalidFormat(_)
            | AppError::DuplicateUsername => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::StoreTimeout(_) | AppError::Internal(_) | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, StoreTimeout, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::StoreTimeout(ref limit) => {
                tracing::error!("Store operation exceeded {:?}", limit);
                "The store did not respond in time".to_string()
            }
            ref client_error => client_error.to_string(),
        };

        // 결과: { "error": { "code": "missing_fields", "message": "Missing required fields" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
