//! # Weekgrid 웹 서버 진입점
//!
//! 사용자별 주간 가능 시간(7자리 이진 문자열)을 인스턴스 단위로 저장/조회/삭제하는 HTTP 서버입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩 (`ENV`가 "prod"가 아닐 때만)
//! 2. 로깅(tracing) 초기화
//! 3. 설정 읽기
//! 4. 저장소 연결 및 테이블 준비 (실패하면 프로세스 종료)
//! 5. 라우터 + 미들웨어 구성
//! 6. HTTP 서버 시작

// ── 모듈 선언 ──
mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::Config;
use db::SqliteInstanceStore;
use routes::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // 운영 환경(ENV=prod)에서는 .env 파일을 읽지 않고 시스템 환경변수만 사용합니다.
    // 로딩 결과는 로거가 준비된 뒤에 기록합니다 (RUST_LOG가 .env에 있을 수 있음).
    let is_prod = std::env::var("ENV").map(|env| env == "prod").unwrap_or(false);
    let dotenv = (!is_prod).then(dotenvy::dotenv);

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 weekgrid, tower_http, axum 모듈을 debug 레벨로 설정
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weekgrid=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenv {
        Some(Ok(path)) => tracing::info!("Loaded environment from {}", path.display()),
        Some(Err(e)) => tracing::warn!("Could not load .env file: {}", e),
        None => tracing::info!("ENV=prod, skipping .env file"),
    }

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting Weekgrid server on {}:{}", config.host, config.port);

    // ── 4단계: 저장소 연결 ──
    // 데이터베이스 파일을 둘 디렉토리가 없으면 먼저 만듭니다.
    if let Some(dir) = config.database_dir() {
        if !dir.exists() {
            tokio::fs::create_dir_all(&dir).await?;
            tracing::info!("Created database directory: {}", dir.display());
        }
    }

    // 연결 실패는 복구하지 않고 프로세스를 종료합니다.
    let database_url = config.database_url();
    let store = SqliteInstanceStore::connect(&database_url, &config.db_collection)
        .await
        .with_context(|| format!("failed to open instance store at {database_url}"))?;
    tracing::info!(
        "Connected to store {} (collection {})",
        database_url,
        config.db_collection
    );

    // ── 5단계: 애플리케이션 상태 + 라우터 ──
    // 저장소는 여기서 한 번 만들어 모든 핸들러에 주입합니다.
    let state = AppState {
        store: Arc::new(store),
        store_timeout: config.store_timeout,
    };
    let app = routes::app(state);

    // ── 6단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
