//! # 인스턴스 모델 정의
//!
//! ## 구조체 역할
//! - `CreateInstanceRequest`: `POST /instance` 요청 본문 (클라이언트 → 서버)
//! - `Instance`: `GET /instance/{id}` 응답의 한 항목 (서버 → 클라이언트)
//! - `StoredRecord`: 저장소 테이블의 한 행. 주(week) 목록이 `|`로 합쳐진 문자열입니다.
//! - `CreateInstanceResponse`, `MessageResponse`: 단순 응답 본문

use serde::{Deserialize, Serialize};

/// 인스턴스 생성 요청 본문.
///
/// JSON 필드 이름은 camelCase(`instanceId`, `binaryWeeks`)입니다.
/// 필드가 빠져 있거나 `null`이면 None이 됩니다.
/// 필수 필드 누락은 역직렬화 에러가 아니라 검증 단계(`MissingFields`)에서 처리합니다.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateInstanceRequest {
    /// 비어 있거나 없으면 서버가 새 ID를 생성합니다
    pub instance_id: Option<String>,
    pub username: Option<String>,
    pub binary_weeks: Option<Vec<String>>,
}

/// 조회 응답의 인스턴스 한 건
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub username: String,
    /// 7자리 이진 문자열 목록 (예: `["1010101"]`)
    pub binary_weeks: Vec<String>,
    /// `YYYY/MM/DD`
    pub creation_date: String,
}

/// 저장소에 저장되는 형태.
///
/// `binary_weeks`는 10진수 토큰을 `|`로 이어 붙인 문자열입니다 (예: `"85|0"`).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredRecord {
    pub instance_id: String,
    pub username: String,
    pub binary_weeks: String,
    pub creation_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceResponse {
    pub instance_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
