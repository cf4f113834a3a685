//! # 저장소 접근 계층 (Data Access Layer)
//!
//! 인스턴스 레코드를 저장하는 저장소와 직접 상호작용하는 코드입니다.
//! 라우트 핸들러는 구체 타입 대신 `InstanceStore` 트레이트를 통해 저장소를 사용합니다.
//! 저장소는 서버 시작 시 한 번 만들어져 `AppState`로 주입됩니다 (전역 싱글턴 없음).
//!
//! 하위 모듈:
//! - `instances`: SQLite 기반 `InstanceStore` 구현

pub mod instances;

pub use instances::SqliteInstanceStore;

use std::{future::Future, time::Duration};

use async_trait::async_trait;

use crate::{error::AppError, models::StoredRecord};

/// 인스턴스 레코드 저장소 인터페이스
///
/// 모든 조회/변경은 `(instance_id, username)` 또는 `instance_id` 기준입니다.
/// 구현체는 여러 요청 태스크에서 동시에 호출되므로 `Send + Sync`여야 합니다.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// 정확히 `(instance_id, username)`인 레코드 수
    async fn count_pair(&self, instance_id: &str, username: &str) -> Result<u64, AppError>;

    /// `instance_id`가 같은 모든 레코드 (저장된 순서)
    async fn find_by_instance(&self, instance_id: &str) -> Result<Vec<StoredRecord>, AppError>;

    /// 같은 `instance_id`를 가진 아무 레코드의 생성일. 레코드가 없으면 None.
    async fn find_creation_date(&self, instance_id: &str) -> Result<Option<String>, AppError>;

    /// 레코드를 추가합니다.
    /// 같은 쌍이 이미 있으면 `AppError::DuplicateUsername`.
    async fn insert(&self, record: &StoredRecord) -> Result<(), AppError>;

    /// `(instance_id, username)` 레코드를 삭제하고 삭제된 수를 반환합니다.
    async fn delete_pair(&self, instance_id: &str, username: &str) -> Result<u64, AppError>;
}

/// 저장소 호출에 제한 시간을 겁니다.
///
/// 시간이 지나면 작업을 버리고(future drop) `AppError::StoreTimeout`을 반환합니다.
pub async fn with_deadline<T, F>(limit: Duration, op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| AppError::StoreTimeout(limit))?
}
