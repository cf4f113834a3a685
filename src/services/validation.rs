//! # 인스턴스 검증
//!
//! 생성 요청이 저장소에 닿기 전에 통과해야 하는 규칙들입니다.
//!
//! 1. `username`, `binaryWeeks`가 비어 있으면 `MissingFields`
//! 2. 주(week) 하나라도 7자리 이진 문자열이 아니면 `InvalidFormat`
//! 3. `instanceId`가 없으면 새로 생성, 있으면 그대로 사용 (존재 여부는 확인하지 않음)
//! 4. 같은 `(instanceId, username)` 레코드가 이미 있으면 `DuplicateUsername`

use std::time::Duration;

use crate::{
    db::{with_deadline, InstanceStore},
    error::AppError,
    models::CreateInstanceRequest,
    services::week_codec,
};

/// 형식 검증을 통과한 생성 요청.
///
/// `weeks`는 이미 10진수로 인코딩된 값(0~127)입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidInstance {
    pub instance_id: String,
    pub username: String,
    pub weeks: Vec<u8>,
}

/// 저장소 없이 확인할 수 있는 규칙(1~3)을 검사합니다.
pub fn validate_request(req: CreateInstanceRequest) -> Result<ValidInstance, AppError> {
    // 없음, null, 빈 값은 모두 같은 "누락"으로 취급합니다.
    let username = req.username.unwrap_or_default();
    let binary_weeks = req.binary_weeks.unwrap_or_default();
    if username.is_empty() || binary_weeks.is_empty() {
        return Err(AppError::MissingFields);
    }

    // collect::<Result<Vec<_>, _>>(): 첫 번째 실패에서 멈추고 그 에러를 반환합니다.
    let weeks = binary_weeks
        .iter()
        .map(|week| week_codec::encode(week))
        .collect::<Result<Vec<_>, _>>()?;

    let instance_id = req
        .instance_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

    Ok(ValidInstance {
        instance_id,
        username,
        weeks,
    })
}

/// 같은 `(instance_id, username)` 레코드가 없는지 확인합니다.
///
/// 이 확인과 이후 insert는 별도의 저장소 호출입니다.
/// 그 사이에 끼어든 중복은 테이블의 UNIQUE 제약이 막습니다.
pub async fn ensure_username_available(
    store: &dyn InstanceStore,
    instance: &ValidInstance,
    limit: Duration,
) -> Result<(), AppError> {
    let count = with_deadline(
        limit,
        store.count_pair(&instance.instance_id, &instance.username),
    )
    .await?;

    if count > 0 {
        return Err(AppError::DuplicateUsername);
    }
    Ok(())
}
