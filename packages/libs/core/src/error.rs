//! 공통 에러 타입
//!
//! 인증, 권한, 입력 검증, SQL 빌더에서 사용되는 에러를 정의합니다.
//! 데이터 저장소 에러는 서비스 계층(`nursery-api`)에서 별도로 다룹니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Nursery 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("authentication required")]
    AuthenticationMissing,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("token issue failed: {reason}")]
    TokenIssue { reason: String },

    #[error("access denied: required role {required}")]
    AuthorizationDenied { required: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("empty payload: {what}")]
    EmptyPayload { what: String },

    #[error("invalid identifier: '{name}'")]
    InvalidIdentifier { name: String },

    #[error("unknown resource: {name}")]
    UnknownResource { name: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Policy / ID Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("policy error: {message}")]
    Policy { message: String },

    #[error("unsupported id generation strategy: {strategy}")]
    UnsupportedIdStrategy { strategy: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Validation { .. }
            | Error::EmptyPayload { .. }
            | Error::InvalidIdentifier { .. }
            | Error::Json(_) => 400,

            // 401 Unauthorized
            Error::AuthenticationMissing | Error::TokenExpired | Error::InvalidToken { .. } => 401,

            // 403 Forbidden
            Error::AuthorizationDenied { .. } => 403,

            // 404 Not Found
            Error::UnknownResource { .. } => 404,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::AuthenticationMissing => "AUTHENTICATION_REQUIRED",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::InvalidToken { .. } => "INVALID_TOKEN",
            Error::TokenIssue { .. } => "TOKEN_ISSUE_FAILED",
            Error::AuthorizationDenied { .. } => "ACCESS_DENIED",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::EmptyPayload { .. } => "EMPTY_PAYLOAD",
            Error::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            Error::UnknownResource { .. } => "NOT_FOUND",
            Error::Policy { .. } => "POLICY_ERROR",
            Error::UnsupportedIdStrategy { .. } => "UNSUPPORTED_ID_STRATEGY",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
