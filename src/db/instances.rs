//! # 인스턴스 SQLite 저장소
//!
//! `InstanceStore`의 SQLite 구현입니다. 테이블 이름은 설정(`DB_COLLECTION`)에서 오며,
//! 서버 시작 시 테이블이 없으면 생성합니다.
//!
//! ## 테이블 구조
//! - `instance_id`, `username`: 레코드 키. `UNIQUE(instance_id, username)`
//! - `binary_weeks`: `|`로 합친 10진수 토큰 (예: `"85|0"`)
//! - `creation_date`: `YYYY/MM/DD`

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use super::InstanceStore;
use crate::{error::AppError, models::StoredRecord};

pub struct SqliteInstanceStore {
    pool: SqlitePool,
    /// 설정 단계에서 SQL 식별자로 검증된 테이블 이름
    table: String,
}

impl SqliteInstanceStore {
    /// 연결 풀을 만들고 테이블을 준비합니다.
    ///
    /// `:memory:` 데이터베이스는 연결마다 별개의 DB가 되므로 연결 1개만 유지합니다.
    pub async fn connect(url: &str, table: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                instance_id   TEXT NOT NULL,
                username      TEXT NOT NULL,
                binary_weeks  TEXT NOT NULL,
                creation_date TEXT NOT NULL,
                UNIQUE (instance_id, username)
            )
            "#,
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for SqliteInstanceStore {
    async fn count_pair(&self, instance_id: &str, username: &str) -> Result<u64, AppError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE instance_id = ? AND username = ?",
            self.table
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(instance_id)
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn find_by_instance(&self, instance_id: &str) -> Result<Vec<StoredRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT instance_id, username, binary_weeks, creation_date
            FROM {}
            WHERE instance_id = ?
            ORDER BY rowid
            "#,
            self.table
        );
        let records = sqlx::query_as::<_, StoredRecord>(&sql)
            .bind(instance_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn find_creation_date(&self, instance_id: &str) -> Result<Option<String>, AppError> {
        let sql = format!(
            "SELECT creation_date FROM {} WHERE instance_id = ? ORDER BY rowid LIMIT 1",
            self.table
        );
        let date = sqlx::query_scalar::<_, String>(&sql)
            .bind(instance_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(date)
    }

    async fn insert(&self, record: &StoredRecord) -> Result<(), AppError> {
        let sql = format!(
            r#"
            INSERT INTO {} (instance_id, username, binary_weeks, creation_date)
            VALUES (?, ?, ?, ?)
            "#,
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(&record.instance_id)
            .bind(&record.username)
            .bind(&record.binary_weeks)
            .bind(&record.creation_date)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            // 중복 확인(count)과 insert 사이에 다른 요청이 먼저 넣은 경우
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_pair(&self, instance_id: &str, username: &str) -> Result<u64, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE instance_id = ? AND username = ?",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(instance_id)
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
