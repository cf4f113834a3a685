//! # 헬스체크(Health Check) 핸들러
//!
//! - `GET /health` → `{ "status": "ok" }`
//!
//! Weekgrid 프로세스가 요청을 받고 있는지만 알려줍니다.
//! 인스턴스 저장소에는 접근하지 않으므로, 저장소가 느리거나 멈춰 있어도 200을 반환합니다.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health` — 서버 상태를 확인합니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
