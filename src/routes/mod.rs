//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과, 이들을 미들웨어와 함께 묶는 `app()`을 제공합니다.
//!
//! 각 하위 모듈:
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `instances`: 인스턴스 생성/조회/삭제 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 |
//! |--------|------|--------|
//! | POST | /instance | `create_instance` |
//! | GET | /instance/{id} | `get_instances` |
//! | DELETE | /instance/{id}/{username} | `delete_instance` |
//! | GET | /health | `health_check` |

pub mod health;
pub mod instances;

pub use health::*;
pub use instances::*;

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{
        header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK},
        Method, Request,
    },
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,                                 // panic → 500 응답
    cors::{Any, CorsLayer},                                       // CORS 설정
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer}, // x-request-id
    trace::TraceLayer,                                            // 요청/응답 로깅
};

use crate::db::InstanceStore;

/// 애플리케이션 공유 상태
///
/// 모든 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 저장소는 트레이트 객체로 주입되므로 테스트에서 다른 구현으로 바꿀 수 있습니다.
/// 서버 시작 후에는 읽기만 하므로 잠금이 필요 없습니다.
#[derive(Clone)]
pub struct AppState {
    /// 인스턴스 저장소 (Arc로 공유, clone해도 같은 저장소를 가리킴)
    pub store: Arc<dyn InstanceStore>,
    /// 저장소 호출 하나에 허용되는 시간
    pub store_timeout: Duration,
}

/// 라우트와 미들웨어를 모두 붙인 애플리케이션 라우터를 만듭니다.
///
/// `.layer()`는 나중에 추가한 것이 바깥쪽을 감쌉니다. 요청은 다음 순서로 지나갑니다:
/// request id 부여 → 로깅 → request id 응답 헤더 복사 → CORS → panic 복구 → 핸들러
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([LINK])
        .max_age(Duration::from_secs(300));

    // 로그 span에 request id를 함께 기록합니다.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id
        )
    });

    Router::new()
        .route("/instance", post(create_instance))
        // axum 0.8부터 경로 파라미터는 {name} 문법을 씁니다.
        .route("/instance/{id}", get(get_instances))
        .route("/instance/{id}/{username}", delete(delete_instance))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
