//! 라우터 테스트 헬퍼

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::accounts::{self, NewAccount};
use crate::config::{Config, Environment};
use crate::gateway::Gateway;
use crate::state::AppState;

/// 메모리 DB + 내장 정책 상태
pub async fn test_state() -> Arc<AppState> {
    test_state_in(Environment::Development).await
}

/// 지정한 실행 환경의 메모리 DB 상태
pub async fn test_state_in(environment: Environment) -> Arc<AppState> {
    let config = Config {
        environment,
        ..Config::for_tests()
    };
    let state = AppState::with_gateway(&config, Gateway::in_memory())
        .await
        .unwrap();
    Arc::new(state)
}

/// 계정 생성 후 (subject, token) 반환
pub async fn login_as(state: &AppState, email: &str, roles: &[&str]) -> (String, String) {
    let account = accounts::create(
        &state.gateway,
        NewAccount {
            email,
            password: "password-123",
            full_name: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        },
    )
    .await
    .unwrap();

    let token = state.issuer.issue(&account.identity().unwrap()).unwrap().token;
    (account.id, token)
}

/// 요청 하나를 라우터에 보내고 (status, JSON body) 반환
pub async fn call(
    state: &Arc<AppState>,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = crate::create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}
