//! Role 기반 접근 가드
//!
//! 라우트 핸들러가 요청을 진행하기 전에 호출합니다. 인증이 없는 경우와
//! role이 부족한 경우는 서로 다른 에러로 구분됩니다.

use crate::auth::Identity;
use crate::error::{Error, Result};

use super::role::normalize_role;

/// 보유 role 중 하나라도 허용 role 중 하나와 일치하는지 (정규화 후 비교)
pub fn has_any_role<S: AsRef<str>>(identity: Option<&Identity>, accepted: &[S]) -> bool {
    let Some(identity) = identity else {
        return false;
    };

    identity.roles().iter().any(|held| {
        let held = normalize_role(held);
        accepted
            .iter()
            .any(|wanted| normalize_role(wanted.as_ref()) == held)
    })
}

/// 단일 role 보유 확인
pub fn has_role(identity: Option<&Identity>, role: &str) -> bool {
    has_any_role(identity, &[role])
}

/// 인증 필수
pub fn require_authenticated(identity: Option<&Identity>) -> Result<&Identity> {
    identity.ok_or(Error::AuthenticationMissing)
}

/// 허용 role 중 하나 필수
pub fn require_any_role<'a, S: AsRef<str>>(
    identity: Option<&'a Identity>,
    accepted: &[S],
) -> Result<&'a Identity> {
    let identity = require_authenticated(identity)?;

    if has_any_role(Some(identity), accepted) {
        return Ok(identity);
    }

    Err(Error::AuthorizationDenied {
        required: accepted
            .iter()
            .map(|r| normalize_role(r.as_ref()))
            .collect::<Vec<_>>()
            .join(" or "),
    })
}

/// 단일 role 필수
pub fn require_role<'a>(identity: Option<&'a Identity>, role: &str) -> Result<&'a Identity> {
    require_any_role(identity, &[role])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(roles: &[&str]) -> Identity {
        Identity::new(
            "u1",
            "a@b.com",
            roles.iter().map(|r| r.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_manager_required_employee_denied() {
        let employee = identity(&["employee"]);
        let err = require_role(Some(&employee), "manager").unwrap_err();
        assert!(matches!(err, Error::AuthorizationDenied { ref required } if required == "manager"));
    }

    #[test]
    fn test_alias_admin_allowed_as_manager() {
        let admin = identity(&["admin"]);
        assert!(require_role(Some(&admin), "manager").is_ok());
        assert!(require_role(Some(&admin), "MANAGER").is_ok());
    }

    #[test]
    fn test_anonymous_gets_authentication_missing() {
        let err = require_role(None, "manager").unwrap_err();
        assert!(matches!(err, Error::AuthenticationMissing));
        assert!(!has_any_role(None, &["manager"]));
    }

    #[test]
    fn test_any_of_matching() {
        let multi = identity(&["customer", "Engineer"]);
        assert!(has_any_role(Some(&multi), &["agriculture_engineer", "manager"]));
        assert!(has_any_role(Some(&multi), &["client"]));
        assert!(!has_any_role(Some(&multi), &["supplier", "delivery_company"]));

        let empty: [&str; 0] = [];
        assert!(!has_any_role(Some(&multi), &empty));
    }

    #[test]
    fn test_denied_lists_all_accepted_roles() {
        let supplier = identity(&["supplier"]);
        let err = require_any_role(Some(&supplier), &["admin", "staff"]).unwrap_err();
        assert_eq!(err.to_string(), "access denied: required role manager or employee");
    }
}
