//! 인증된 주체 (Identity)

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 요청 단위로 확정되는 인증 주체
///
/// 토큰 검증 후 생성되며 요청 처리 동안 변경되지 않습니다.
/// role 목록은 비어 있을 수 없고, 첫 번째 항목이 주 role입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    subject: String,
    email: String,
    roles: Vec<String>,
}

impl Identity {
    /// 새 Identity 생성
    pub fn new(subject: impl Into<String>, email: impl Into<String>, roles: Vec<String>) -> Result<Self> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(Error::validation("subject", "must not be empty"));
        }
        if roles.is_empty() {
            return Err(Error::validation("roles", "at least one role is required"));
        }

        Ok(Self {
            subject,
            email: email.into(),
            roles,
        })
    }

    /// Subject ID
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Role 목록 (토큰에 기록된 표기 그대로)
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// 주 role (첫 번째 항목)
    pub fn primary_role(&self) -> &str {
        &self.roles[0]
    }

}
