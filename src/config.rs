//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `ENV`가 `"prod"`가 아니면 `main`에서 먼저 `.env` 파일을 로딩합니다.
//!
//! 설정 항목:
//! - `DB_URI`: 저장소 위치 (sqlx SQLite URL, 필수)
//! - `DB_NAME`: 데이터베이스 이름 (선택, 있으면 `{DB_URI}/{DB_NAME}.db`로 연결)
//! - `DB_COLLECTION`: 레코드를 담는 테이블 이름 (기본값: `instances`)
//! - `HOST`: 서버 바인딩 주소 (기본값: `0.0.0.0`)
//! - `PORT`: 서버 포트 번호 (기본값: `8080`)
//! - `STORE_TIMEOUT_SECS`: 저장소 호출 제한 시간 (기본값: 10초)

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

/// 저장소 호출 하나에 허용되는 기본 시간
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_COLLECTION: &str = "instances";

/// 설정 로딩 실패
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// 저장소 위치 (예: "sqlite://data" 또는 "sqlite::memory:")
    pub db_uri: String,
    /// 데이터베이스 이름. None이면 `db_uri`를 그대로 사용합니다.
    pub db_name: Option<String>,
    /// 레코드 테이블 이름 (SQL 식별자여야 함)
    pub db_collection: String,
    pub host: String,
    pub port: u16,
    pub store_timeout: Duration,
}

impl Config {
    /// 프로세스 환경변수에서 설정을 읽습니다.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 키 → 값 조회 함수로부터 설정을 만듭니다.
    ///
    /// 테스트에서 프로세스 환경변수를 건드리지 않도록 조회 방식을 주입받습니다.
    /// 빈 문자열은 값이 없는 것으로 취급합니다.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_uri = get("DB_URI").ok_or(ConfigError::Missing("DB_URI"))?;
        let db_name = get("DB_NAME");

        let db_collection =
            get("DB_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        if !is_sql_identifier(&db_collection) {
            return Err(ConfigError::Invalid {
                key: "DB_COLLECTION",
                reason: format!("{db_collection:?} is not a valid table name"),
            });
        }

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{raw:?}: {e}"),
            })?,
            None => {
                tracing::info!("PORT not set, defaulting to port {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let store_timeout = match get("STORE_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "STORE_TIMEOUT_SECS",
                        reason: format!("{raw:?} is not a positive number of seconds"),
                    })
                }
            },
            None => DEFAULT_STORE_TIMEOUT,
        };

        Ok(Self {
            db_uri,
            db_name,
            db_collection,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            store_timeout,
        })
    }

    /// sqlx에 넘길 연결 URL.
    ///
    /// `DB_NAME`이 있으면 `DB_URI` 아래의 `{DB_NAME}.db` 파일을 가리킵니다.
    pub fn database_url(&self) -> String {
        match &self.db_name {
            Some(name) => format!("{}/{}.db", self.db_uri.trim_end_matches('/'), name),
            None => self.db_uri.clone(),
        }
    }

    /// `DB_NAME`을 쓸 때 데이터베이스 파일이 놓일 디렉토리.
    /// `DB_URI`가 `sqlite://dir` 또는 `sqlite:dir` 형태일 때만 계산됩니다.
    pub fn database_dir(&self) -> Option<PathBuf> {
        self.db_name.as_ref()?;
        let dir = self
            .db_uri
            .strip_prefix("sqlite://")
            .or_else(|| self.db_uri.strip_prefix("sqlite:"))?
            .trim_end_matches('/');
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

/// 테이블 이름은 SQL 문자열에 직접 들어가므로 `[A-Za-z_][A-Za-z0-9_]*`만 허용합니다.
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
