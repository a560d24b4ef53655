//! Role 열거형과 별칭 정규화
//!
//! 프론트엔드나 이전 토큰에서 들어오는 다양한 role 표기(`admin`, `Engineer`,
//! `delivery-company` 등)를 하나의 정규 이름으로 맞춥니다.

use serde::{Deserialize, Serialize};

/// 정규 Role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Employee,
    Customer,
    Supplier,
    AgricultureEngineer,
    DeliveryCompany,
}

impl Role {
    /// 모든 정규 Role
    pub const ALL: [Role; 6] = [
        Role::Manager,
        Role::Employee,
        Role::Customer,
        Role::Supplier,
        Role::AgricultureEngineer,
        Role::DeliveryCompany,
    ];

    /// 정규 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::Customer => "customer",
            Role::Supplier => "supplier",
            Role::AgricultureEngineer => "agriculture_engineer",
            Role::DeliveryCompany => "delivery_company",
        }
    }

    /// 정규 이름으로 수렴하는 별칭 목록 (이미 소문자/밑줄 형태)
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Role::Manager => &["admin", "administrator", "owner"],
            Role::Employee => &["staff", "worker"],
            Role::Customer => &["client", "buyer"],
            Role::Supplier => &["vendor"],
            Role::AgricultureEngineer => &[
                "engineer",
                "agri_engineer",
                "agricultural_engineer",
                "agriculture",
            ],
            Role::DeliveryCompany => &["delivery", "courier", "delivery_partner"],
        }
    }

    /// 문자열에서 파싱 (별칭 포함, 대소문자 무시)
    pub fn parse(raw: &str) -> Option<Role> {
        let key = canonical_key(raw);
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == key || role.aliases().contains(&key.as_str()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role 문자열 정규화
///
/// 알려진 role/별칭이면 정규 이름을, 아니면 소문자·밑줄로 정리한 값을 돌려줍니다.
pub fn normalize_role(raw: &str) -> String {
    match Role::parse(raw) {
        Some(role) => role.as_str().to_string(),
        None => canonical_key(raw),
    }
}

fn canonical_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_alias() {
        assert_eq!(Role::parse("manager"), Some(Role::Manager));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Manager));
        assert_eq!(Role::parse("Engineer"), Some(Role::AgricultureEngineer));
        assert_eq!(Role::parse("delivery-company"), Some(Role::DeliveryCompany));
        assert_eq!(Role::parse("Agriculture Engineer"), Some(Role::AgricultureEngineer));
        assert_eq!(Role::parse("gardener"), None);
    }

    #[test]
    fn test_alias_normalizes_like_canonical() {
        for role in Role::ALL {
            let canonical = normalize_role(role.as_str());
            for alias in role.aliases() {
                assert_eq!(normalize_role(alias), canonical, "alias {alias}");
                assert_eq!(normalize_role(&alias.to_uppercase()), canonical);
            }
        }
    }

    #[test]
    fn test_unknown_role_is_lowercased() {
        assert_eq!(normalize_role(" Head-Gardener "), "head_gardener");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Role::AgricultureEngineer).unwrap();
        assert_eq!(json, "\"agriculture_engineer\"");
    }
}
