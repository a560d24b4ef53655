//! 계정 인증 핸들러
//!
//! - `POST /api/auth/login`
//! - `POST /api/auth/register`
//! - `GET /api/auth/me`

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use nursery_core::roles::{has_role, require_authenticated, require_role, Role};
use nursery_core::Error;

use crate::accounts::{self, Account, NewAccount};
use crate::error::{ApiError, Result};
use crate::middleware::CurrentIdentity;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    /// 관리자만 지정 가능
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let invalid = || ApiError::Unauthorized {
        message: "invalid email or password".to_string(),
    };

    let account = accounts::find_by_email(&state.gateway, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !account.is_active || !account.check_password(&req.password) {
        tracing::info!(account = %account.id, "Login rejected");
        return Err(invalid());
    }

    Ok(Json(token_response(&state, &account)?))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let email = accounts::normalize_email(&req.email);
    if !is_plausible_email(&email) {
        return Err(Error::validation("email", "must be a valid email address").into());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        )
        .into());
    }

    let roles = match req.roles {
        Some(requested) => {
            require_role(identity.get(), Role::Manager.as_str())?;
            canonical_roles(&requested)?
        }
        None => vec![Role::Customer.as_str().to_string()],
    };

    let account = accounts::create(
        &state.gateway,
        NewAccount {
            email: &email,
            password: &req.password,
            full_name: req.full_name.as_deref(),
            roles,
        },
    )
    .await?;

    // 관리자가 만든 계정은 토큰을 돌려주지 않음
    let body = if has_role(identity.get(), Role::Manager.as_str()) {
        json!({ "user": account.profile() })
    } else {
        token_response(&state, &account)?
    };

    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/auth/me
pub async fn me(identity: CurrentIdentity) -> Result<Json<Value>> {
    let identity = require_authenticated(identity.get())?;

    Ok(Json(json!({
        "data": {
            "id": identity.subject(),
            "email": identity.email(),
            "roles": identity.roles(),
            "primaryRole": identity.primary_role(),
        }
    })))
}

fn token_response(state: &AppState, account: &Account) -> Result<Value> {
    let issued = state.issuer.issue(&account.identity()?)?;
    Ok(json!({
        "token": issued.token,
        "expiresAt": issued.expires_at.to_rfc3339(),
        "user": account.profile(),
    }))
}

fn canonical_roles(requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Err(Error::validation("roles", "at least one role is required").into());
    }

    let mut roles: Vec<String> = Vec::new();
    for raw in requested {
        let role = Role::parse(raw)
            .ok_or_else(|| Error::validation("roles", format!("unknown role: {}", raw)))?;
        let name = role.as_str().to_string();
        if !roles.contains(&name) {
            roles.push(name);
        }
    }
    Ok(roles)
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(' '),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{call, login_as, test_state};

    #[tokio::test]
    async fn test_register_login_me() {
        let state = test_state().await;

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "Fern@Example.com", "password": "green-thumb", "fullName": "Fern" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["roles"], json!(["customer"]));
        assert!(body["token"].is_string());

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "fern@example.com", "password": "green-thumb" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(&state, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "fern@example.com");
        assert_eq!(body["data"]["primaryRole"], "customer");

        let (status, _) = call(&state, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let state = test_state().await;
        login_as(&state, "grower@nursery.test", &["employee"]).await;

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "grower@nursery.test", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@nursery.test", "password": "whatever1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_roles_require_manager() {
        let state = test_state().await;
        let request = json!({ "email": "eng@nursery.test", "password": "long-enough", "roles": ["engineer"] });

        let (status, _) = call(&state, Method::POST, "/api/auth/register", None, Some(request.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, customer) = login_as(&state, "c@nursery.test", &["customer"]).await;
        let (status, _) = call(&state, Method::POST, "/api/auth/register", Some(&customer), Some(request.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, manager) = login_as(&state, "m@nursery.test", &["manager"]).await;
        let (status, body) = call(&state, Method::POST, "/api/auth/register", Some(&manager), Some(request.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["roles"], json!(["agriculture_engineer"]));
        assert!(body.get("token").is_none());

        let (status, _) = call(&state, Method::POST, "/api/auth/register", Some(&manager), Some(request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = test_state().await;

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "long-enough" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ok@nursery.test", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
