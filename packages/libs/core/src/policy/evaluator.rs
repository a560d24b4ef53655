//! 리소스 접근 평가기
//!
//! 요청 Identity와 리소스 정책을 비교해 허용 범위를 결정합니다.

use crate::auth::Identity;
use crate::error::{Error, Result};
use crate::roles::has_role;

use super::resource::{AccessRule, Operation, ResourcePolicy, RoleRequirement};

/// 허용된 행 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowScope {
    /// 모든 행
    All,

    /// `column` 값이 `subject`인 행만
    Owned { column: String, subject: String },
}

/// 정책 평가기
pub struct PolicyEvaluator<'a> {
    policy: &'a ResourcePolicy,
}

impl<'a> PolicyEvaluator<'a> {
    pub fn new(policy: &'a ResourcePolicy) -> Self {
        Self { policy }
    }

    /// 리소스 작업 권한 평가 (First Rule Match Wins)
    pub fn evaluate(
        &self,
        resource: &str,
        op: Operation,
        identity: Option<&Identity>,
    ) -> Result<RowScope> {
        let def = self.policy.get(resource)?;

        let Some(op_rules) = def.get_operation(op) else {
            // 규칙이 없으면 인증된 사용자만 허용
            return match identity {
                Some(_) => Ok(RowScope::All),
                None => Err(Error::AuthenticationMissing),
            };
        };

        for rule in &op_rules.rules {
            if !Self::matches(rule, identity) {
                continue;
            }

            if !rule.own_rows {
                return Ok(RowScope::All);
            }

            // own_rows는 subject가 있어야 의미가 있음
            let (Some(identity), Some(column)) = (identity, def.owner_column.as_ref()) else {
                continue;
            };
            return Ok(RowScope::Owned {
                column: column.clone(),
                subject: identity.subject().to_string(),
            });
        }

        match identity {
            None => Err(Error::AuthenticationMissing),
            Some(_) => Err(Error::AuthorizationDenied {
                required: Self::describe(&op_rules.rules),
            }),
        }
    }

    fn matches(rule: &AccessRule, identity: Option<&Identity>) -> bool {
        if rule.roles.is_empty() {
            return true;
        }

        rule.roles.iter().any(|req| match req {
            RoleRequirement::Public => true,
            RoleRequirement::Authenticated => identity.is_some(),
            RoleRequirement::Role(role) => has_role(identity, role),
        })
    }

    fn describe(rules: &[AccessRule]) -> String {
        let mut names: Vec<&str> = Vec::new();
        for req in rules.iter().flat_map(|r| r.roles.iter()) {
            if let RoleRequirement::Role(role) = req {
                if !names.contains(&role.as_str()) {
                    names.push(role);
                }
            }
        }
        names.join(" or ")
    }
}
