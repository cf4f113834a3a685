//! # 인스턴스 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST   /instance`                 → 인스턴스에 사용자 레코드 추가
//! - `GET    /instance/{id}`            → 인스턴스의 모든 레코드 조회
//! - `DELETE /instance/{id}/{username}` → 레코드 하나 삭제
//!
//! 각 핸들러는 재시도 없이 한 줄로 흘러가는 파이프라인입니다.
//! 요청 하나가 변경하는 저장소 작업은 최대 한 번이며, 저장소 호출마다 제한 시간이 걸립니다.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    db::with_deadline,
    error::AppError,
    models::*,
    services::{validation, week_codec},
};

/// 생성일 형식: `YYYY/MM/DD`
const CREATION_DATE_FORMAT: &str = "%Y/%m/%d";

/// `POST /instance` — 인스턴스에 사용자 레코드를 추가합니다.
///
/// 본문은 `Json` 추출자 대신 `Bytes`로 받아 직접 파싱합니다.
/// Content-Type 헤더와 상관없이 파싱 실패는 모두 400이 되고, 파서 메시지가 그대로 전달됩니다.
///
/// # 처리 흐름
/// 1. JSON 파싱
/// 2. 필수 필드/형식 검증 + 주(week) 인코딩
/// 3. `(instanceId, username)` 중복 확인
/// 4. 생성일 결정: 같은 instanceId의 기존 레코드가 있으면 그 날짜, 없으면 오늘
/// 5. 저장 후 `{ "instanceId": ... }` 반환
pub async fn create_instance(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateInstanceResponse>, AppError> {
    let req: CreateInstanceRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let valid = validation::validate_request(req)?;
    validation::ensure_username_available(state.store.as_ref(), &valid, state.store_timeout)
        .await?;

    let creation_date = with_deadline(
        state.store_timeout,
        state.store.find_creation_date(&valid.instance_id),
    )
    .await?
    .unwrap_or_else(|| chrono::Local::now().format(CREATION_DATE_FORMAT).to_string());

    let record = StoredRecord {
        instance_id: valid.instance_id,
        username: valid.username,
        binary_weeks: week_codec::join_weeks(&valid.weeks),
        creation_date,
    };
    with_deadline(state.store_timeout, state.store.insert(&record)).await?;

    tracing::info!(
        instance_id = %record.instance_id,
        username = %record.username,
        weeks = valid.weeks.len(),
        "instance record created"
    );

    Ok(Json(CreateInstanceResponse {
        instance_id: record.instance_id,
    }))
}

/// `GET /instance/{id}` — 인스턴스의 모든 레코드를 조회합니다.
///
/// 레코드가 없으면 에러가 아니라 빈 배열 `[]`을 반환합니다.
/// 저장된 토큰이 손상되어 7자리로 되돌릴 수 없으면 500.
pub async fn get_instances(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Instance>>, AppError> {
    let records = with_deadline(state.store_timeout, state.store.find_by_instance(&id)).await?;

    let instances = records
        .into_iter()
        .map(|record| {
            let binary_weeks = week_codec::split_weeks(&record.binary_weeks).map_err(|e| {
                AppError::Internal(format!(
                    "record ({}, {}) holds unreadable weeks: {}",
                    record.instance_id, record.username, e
                ))
            })?;
            Ok::<_, AppError>(Instance {
                instance_id: record.instance_id,
                username: record.username,
                binary_weeks,
                creation_date: record.creation_date,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(instances))
}

/// `DELETE /instance/{id}/{username}` — 레코드 하나를 삭제합니다.
///
/// `Path((id, username))`: 경로 변수 2개를 URL 순서대로 튜플로 추출합니다.
/// 삭제된 레코드가 없으면 404.
pub async fn delete_instance(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted =
        with_deadline(state.store_timeout, state.store.delete_pair(&id, &username)).await?;
    if deleted == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(instance_id = %id, username = %username, "instance record deleted");

    Ok(Json(MessageResponse {
        message: "Record deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{
            header::{
                ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
                ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
                ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
                ACCESS_CONTROL_REQUEST_METHOD, CONTENT_TYPE, ORIGIN,
            },
            HeaderName, Method, Request, StatusCode,
        },
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // oneshot()

    use crate::{
        db::{InstanceStore, SqliteInstanceStore},
        error::AppError,
        models::StoredRecord,
        routes::{app, AppState},
    };

    async fn memory_app() -> (Router, Arc<SqliteInstanceStore>) {
        let store = Arc::new(
            SqliteInstanceStore::connect("sqlite::memory:", "instances")
                .await
                .unwrap(),
        );
        let state = AppState {
            store: store.clone(),
            store_timeout: Duration::from_secs(10),
        };
        (app(state), store)
    }

    async fn send_raw(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
        send_raw(app, method, uri, body).await
    }

    fn today() -> String {
        chrono::Local::now().format("%Y/%m/%d").to_string()
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let (app, _) = memory_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/instance",
            Some(json!({ "username": "alice", "binaryWeeks": ["1010101"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["instanceId"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let (status, body) = send(&app, Method::GET, &format!("/instance/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "instanceId": id,
                "username": "alice",
                "binaryWeeks": ["1010101"],
                "creationDate": today(),
            }])
        );
    }

    #[tokio::test]
    async fn weeks_keep_their_order_and_padding() {
        let (app, store) = memory_app().await;
        let weeks = json!(["0000001", "1111111", "0000000", "0100000"]);

        let payload = json!({
            "instanceId": "team",
            "username": "alice",
            "binaryWeeks": weeks.clone(),
        });
        let (status, _) = send(&app, Method::POST, "/instance", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);

        let stored = store.find_by_instance("team").await.unwrap();
        assert_eq!(stored[0].binary_weeks, "1|127|0|32");

        let (_, body) = send(&app, Method::GET, "/instance/team", None).await;
        assert_eq!(body[0]["binaryWeeks"], weeks);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let (app, _) = memory_app().await;

        for payload in [
            json!({ "username": "", "binaryWeeks": ["1010101"] }),
            json!({ "username": "alice", "binaryWeeks": [] }),
            json!({ "binaryWeeks": ["1010101"] }),
            json!({ "username": "alice" }),
            json!({ "username": null, "binaryWeeks": ["1010101"] }),
            json!({ "username": "alice", "binaryWeeks": null }),
        ] {
            let (status, body) =
                send(&app, Method::POST, "/instance", Some(payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body["error"]["code"], "missing_fields");
        }
    }

    #[tokio::test]
    async fn malformed_weeks_are_rejected() {
        let (app, store) = memory_app().await;

        for week in ["101010", "10101010", "10101a1", "2222222"] {
            let payload = json!({
                "instanceId": "team",
                "username": "alice",
                "binaryWeeks": ["1111111", week],
            });
            let (status, body) = send(&app, Method::POST, "/instance", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{week}");
            assert_eq!(body["error"]["code"], "invalid_format");
        }
        assert!(store.find_by_instance("team").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let (app, _) = memory_app().await;

        for raw in ["", "{", "{\"username\": 5}", "null"] {
            let (status, body) =
                send_raw(&app, Method::POST, "/instance", Body::from(raw)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{raw:?}");
            assert_eq!(body["error"]["code"], "bad_request");
            assert!(!body["error"]["message"].as_str().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let (app, store) = memory_app().await;
        let payload = json!({
            "instanceId": "team",
            "username": "alice",
            "binaryWeeks": ["1010101"],
        });

        let (status, _) = send(&app, Method::POST, "/instance", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::POST, "/instance", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "duplicate_username");
        assert_eq!(store.find_by_instance("team").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn later_usernames_reuse_the_creation_date() {
        let (app, store) = memory_app().await;
        store
            .insert(&StoredRecord {
                instance_id: "team".to_string(),
                username: "alice".to_string(),
                binary_weeks: "85".to_string(),
                creation_date: "2020/01/02".to_string(),
            })
            .await
            .unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            "/instance",
            Some(json!({ "instanceId": "team", "username": "bob", "binaryWeeks": ["0000011"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "instanceId": "team" }));

        let (_, body) = send(&app, Method::GET, "/instance/team", None).await;
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r["creationDate"] == "2020/01/02"));
    }

    #[tokio::test]
    async fn fetching_an_unknown_instance_returns_an_empty_list() {
        let (app, _) = memory_app().await;
        let (status, body) = send(&app, Method::GET, "/instance/nobody", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn corrupt_stored_weeks_are_an_internal_error() {
        let (app, store) = memory_app().await;
        store
            .insert(&StoredRecord {
                instance_id: "team".to_string(),
                username: "alice".to_string(),
                binary_weeks: "85|300".to_string(),
                creation_date: "2026/10/17".to_string(),
            })
            .await
            .unwrap();

        let (status, body) = send(&app, Method::GET, "/instance/team", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
    }

    #[tokio::test]
    async fn delete_removes_only_the_named_record() {
        let (app, _) = memory_app().await;
        for name in ["alice", "bob"] {
            send(
                &app,
                Method::POST,
                "/instance",
                Some(json!({ "instanceId": "team", "username": name, "binaryWeeks": ["1010101"] })),
            )
            .await;
        }

        let (status, body) = send(&app, Method::DELETE, "/instance/team/alice", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Record deleted successfully" }));

        let (_, body) = send(&app, Method::GET, "/instance/team", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["username"], "bob");
    }

    #[tokio::test]
    async fn deleting_a_missing_record_is_not_found() {
        let (app, _) = memory_app().await;
        let (status, body) = send(&app, Method::DELETE, "/instance/team/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    /// 모든 호출이 제한 시간보다 오래 걸리는 저장소
    struct StalledStore;

    #[async_trait]
    impl InstanceStore for StalledStore {
        async fn count_pair(&self, _: &str, _: &str) -> Result<u64, AppError> {
            stall().await
        }
        async fn find_by_instance(&self, _: &str) -> Result<Vec<StoredRecord>, AppError> {
            stall().await
        }
        async fn find_creation_date(&self, _: &str) -> Result<Option<String>, AppError> {
            stall().await
        }
        async fn insert(&self, _: &StoredRecord) -> Result<(), AppError> {
            stall().await
        }
        async fn delete_pair(&self, _: &str, _: &str) -> Result<u64, AppError> {
            stall().await
        }
    }

    async fn stall<T>() -> Result<T, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(AppError::Internal("stalled store answered".to_string()))
    }

    #[tokio::test]
    async fn slow_store_calls_time_out() {
        let app = app(AppState {
            store: Arc::new(StalledStore),
            store_timeout: Duration::from_millis(20),
        });

        let (status, body) = send(
            &app,
            Method::POST,
            "/instance",
            Some(json!({ "username": "alice", "binaryWeeks": ["1010101"] })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "store_timeout");

        let (status, _) = send(&app, Method::GET, "/instance/team", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(&app, Method::DELETE, "/instance/team/alice", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // 헬스체크는 저장소를 거치지 않습니다.
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    /// 조회 중에 panic을 일으키는 저장소
    struct PanickingStore;

    #[async_trait]
    impl InstanceStore for PanickingStore {
        async fn count_pair(&self, _: &str, _: &str) -> Result<u64, AppError> {
            panic!("count_pair exploded")
        }
        async fn find_by_instance(&self, _: &str) -> Result<Vec<StoredRecord>, AppError> {
            panic!("find_by_instance exploded")
        }
        async fn find_creation_date(&self, _: &str) -> Result<Option<String>, AppError> {
            panic!("find_creation_date exploded")
        }
        async fn insert(&self, _: &StoredRecord) -> Result<(), AppError> {
            panic!("insert exploded")
        }
        async fn delete_pair(&self, _: &str, _: &str) -> Result<u64, AppError> {
            panic!("delete_pair exploded")
        }
    }

    #[tokio::test]
    async fn handler_panics_become_internal_errors() {
        let app = app(AppState {
            store: Arc::new(PanickingStore),
            store_timeout: Duration::from_secs(10),
        });

        for (method, uri) in [
            (Method::GET, "/instance/team"),
            (Method::DELETE, "/instance/team/alice"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        }

        // 같은 라우터가 계속 요청을 처리합니다.
        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn preflight_advertises_the_cors_policy() {
        let (app, _) = memory_app().await;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/instance")
            .header(ORIGIN, "https://calendar.example")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(ACCESS_CONTROL_REQUEST_HEADERS, "content-type,x-csrf-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_ascii_lowercase()
        };

        assert_eq!(header(ACCESS_CONTROL_ALLOW_ORIGIN), "*");
        let methods = header(ACCESS_CONTROL_ALLOW_METHODS);
        for method in ["get", "post", "put", "delete", "options"] {
            assert!(methods.contains(method), "{methods}");
        }
        let headers = header(ACCESS_CONTROL_ALLOW_HEADERS);
        for name in ["accept", "authorization", "content-type", "x-csrf-token"] {
            assert!(headers.contains(name), "{headers}");
        }
        assert_eq!(header(ACCESS_CONTROL_MAX_AGE), "300");
    }

    #[tokio::test]
    async fn cross_origin_responses_expose_link() {
        let (app, _) = memory_app().await;
        let request = Request::builder()
            .uri("/instance/team")
            .header(ORIGIN, "https://calendar.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(ACCESS_CONTROL_EXPOSE_HEADERS)
                .and_then(|value| value.to_str().ok())
                .map(str::to_ascii_lowercase)
                .as_deref(),
            Some("link")
        );
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let (app, _) = memory_app().await;
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
