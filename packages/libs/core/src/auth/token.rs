//! 토큰 검증 및 발급
//!
//! 공유 시크릿(HS256)으로 서명된 Bearer 토큰을 다룹니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{Error, Result};

use super::claims::{AccessTokenClaims, ClaimsShape};
use super::identity::Identity;

/// `Authorization` 헤더에서 Bearer 토큰 추출
///
/// 헤더가 없거나 Bearer 형식이 아니면 `None` (익명 요청으로 취급).
pub fn bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let value = auth_header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// 토큰 검증기
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// 새 검증기 생성
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 토큰 검증 및 Identity 추출
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let data = decode::<ClaimsShape>(token.trim(), &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::InvalidToken {
                    reason: e.to_string(),
                },
            },
        )?;

        data.claims.into_identity()
    }
}

/// 발급된 토큰
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// 토큰 발급기 (검증기와 같은 시크릿 사용)
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Identity에 대한 Access Token 발급
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken> {
        let claims = AccessTokenClaims::for_identity(identity, self.ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| {
            Error::TokenIssue {
                reason: e.to_string(),
            }
        })?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }
}
