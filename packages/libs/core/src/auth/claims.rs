//! 토큰 Claims
//!
//! 현재 형식(`roles` 배열)과 이전 형식(단일 `role`)을 모두 받아
//! 하나의 [`Identity`]로 옮기는 마이그레이션을 담당합니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::identity::Identity;

/// 발급되는 Access Token Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (사용자 ID)
    pub sub: String,

    pub email: String,

    /// Role 목록
    pub roles: Vec<String>,

    /// 주 role (이전 클라이언트 호환용)
    pub role: String,

    /// 발급 시각 (unix seconds)
    pub iat: i64,

    /// 만료 시각 (unix seconds)
    pub exp: i64,
}

impl AccessTokenClaims {
    /// Identity로부터 claims 생성
    pub fn for_identity(identity: &Identity, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: identity.subject().to_string(),
            email: identity.email().to_string(),
            roles: identity.roles().to_vec(),
            role: identity.primary_role().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// 만료 시각
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// 검증 시 받아들이는 Claims 형태
///
/// `roles`가 있으면 현재 형식, 없고 `role`만 있으면 이전 형식입니다.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClaimsShape {
    Current(CurrentClaims),
    Legacy(LegacyClaims),
}

/// 현재 형식
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentClaims {
    #[serde(default)]
    pub sub: Option<SubjectClaim>,

    #[serde(default)]
    pub id: Option<SubjectClaim>,

    #[serde(default, rename = "userId")]
    pub user_id: Option<SubjectClaim>,

    #[serde(default)]
    pub email: String,

    pub roles: Vec<String>,

    pub exp: i64,
}

/// 이전 형식 (단일 role)
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyClaims {
    #[serde(default)]
    pub sub: Option<SubjectClaim>,

    #[serde(default)]
    pub id: Option<SubjectClaim>,

    #[serde(default, rename = "userId")]
    pub user_id: Option<SubjectClaim>,

    #[serde(default)]
    pub email: String,

    pub role: String,

    pub exp: i64,
}

/// 발급자에 따라 `sub`, `id`, `userId` 중 여러 개가 함께 올 수 있으며
/// 이 순서로 처음 있는 값을 subject로 사용합니다.
fn resolve_subject(
    sub: Option<SubjectClaim>,
    id: Option<SubjectClaim>,
    user_id: Option<SubjectClaim>,
) -> Result<String> {
    sub.or(id)
        .or(user_id)
        .map(SubjectClaim::into_string)
        .ok_or_else(|| Error::InvalidToken {
            reason: "missing subject".to_string(),
        })
}

/// Subject 값 (이전 토큰은 숫자 ID를 담기도 함)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubjectClaim {
    Text(String),
    Number(i64),
}

impl SubjectClaim {
    fn into_string(self) -> String {
        match self {
            SubjectClaim::Text(s) => s,
            SubjectClaim::Number(n) => n.to_string(),
        }
    }
}

impl ClaimsShape {
    /// 정규 Identity로 변환
    pub fn into_identity(self) -> Result<Identity> {
        let (sub, email, roles) = match self {
            ClaimsShape::Current(c) => (resolve_subject(c.sub, c.id, c.user_id)?, c.email, c.roles),
            ClaimsShape::Legacy(c) => (resolve_subject(c.sub, c.id, c.user_id)?, c.email, vec![c.role]),
        };

        let roles: Vec<String> = roles
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        Identity::new(sub, email, roles).map_err(|e| Error::InvalidToken {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_shape() {
        let shape: ClaimsShape = serde_json::from_value(json!({
            "sub": "u1",
            "email": "a@b.com",
            "roles": ["manager", "employee"],
            "role": "manager",
            "exp": 10
        }))
        .unwrap();

        assert!(matches!(shape, ClaimsShape::Current(_)));
        let identity = shape.into_identity().unwrap();
        assert_eq!(identity.roles(), ["manager", "employee"]);
    }

    #[test]
    fn test_legacy_shape_with_user_id() {
        let shape: ClaimsShape = serde_json::from_value(json!({
            "userId": 42,
            "email": "old@b.com",
            "role": "admin",
            "exp": 10
        }))
        .unwrap();

        assert!(matches!(shape, ClaimsShape::Legacy(_)));
        let identity = shape.into_identity().unwrap();
        assert_eq!(identity.subject(), "42");
        assert_eq!(identity.roles(), ["admin"]);
    }

    #[test]
    fn test_subject_fallback_order() {
        let shape: ClaimsShape = serde_json::from_value(json!({
            "sub": "from-sub",
            "id": "from-id",
            "userId": 7,
            "roles": ["customer"],
            "exp": 10
        }))
        .unwrap();
        assert_eq!(shape.into_identity().unwrap().subject(), "from-sub");

        let shape: ClaimsShape = serde_json::from_value(json!({
            "id": "from-id",
            "userId": 7,
            "role": "customer",
            "exp": 10
        }))
        .unwrap();
        assert_eq!(shape.into_identity().unwrap().subject(), "from-id");
    }

    #[test]
    fn test_missing_subject_is_invalid_token() {
        let shape: ClaimsShape = serde_json::from_value(json!({ "roles": ["customer"], "exp": 10 })).unwrap();
        assert!(matches!(shape.into_identity(), Err(Error::InvalidToken { .. })));
    }

    #[test]
    fn test_empty_roles_is_invalid_token() {
        let shape: ClaimsShape = serde_json::from_value(json!({
            "sub": "u1",
            "roles": [],
            "exp": 10
        }))
        .unwrap();

        assert!(matches!(shape.into_identity(), Err(Error::InvalidToken { .. })));
    }

    #[test]
    fn test_claims_for_identity() {
        let identity = Identity::new("u1", "a@b.com", vec!["customer".to_string()]).unwrap();
        let claims = AccessTokenClaims::for_identity(&identity, Duration::hours(1));

        assert_eq!(claims.role, "customer");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.expires_at() > Utc::now());
    }
}
