//! API 미들웨어
//!
//! 요청 ID, Bearer 토큰 인증 미들웨어와 Identity 추출기를 정의합니다.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use nursery_core::auth::{bearer_token, Identity};

use crate::error::ApiError;
use crate::state::AppState;

/// 요청 단위 컨텍스트
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: String,

    /// 저장소 에러 메시지를 응답에 포함할지 여부 (운영 환경에서는 false)
    pub expose_store_errors: bool,
}

tokio::task_local! {
    pub(crate) static REQUEST: RequestContext;
}

pub fn current_request_id() -> Option<String> {
    REQUEST.try_with(|ctx| ctx.id.clone()).ok()
}

/// 요청 컨텍스트 밖에서는 항상 false
pub fn store_errors_exposed() -> bool {
    REQUEST.try_with(|ctx| ctx.expose_store_errors).unwrap_or(false)
}

/// 요청 ID를 만들고 환경 설정과 함께 요청 처리 동안 유지
pub async fn request_context(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext {
        id: Uuid::new_v4().to_string(),
        expose_store_errors: !state.config.environment.is_production(),
    };
    let id = ctx.id.clone();

    let mut resp = REQUEST.scope(ctx, next.run(req)).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}

/// Bearer 토큰 인증
///
/// 토큰이 없으면 익명으로 통과하고, 토큰이 있으면 검증 결과 Identity를
/// request extension에 넣습니다. 검증 실패는 바로 401로 끝납니다.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if let Some(token) = bearer_token(header) {
        let identity = state.verifier.verify(token).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            e
        })?;
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// 현재 요청의 Identity (익명이면 None)
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

impl CurrentIdentity {
    pub fn get(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Identity>().cloned()))
    }
}
