//! 리소스 정책 정의
//!
//! `policy.yaml`의 구조를 정의합니다. 각 리소스는 REST 경로 이름과
//! 실제 테이블, 노출 컬럼, 작업별 role 규칙을 묶습니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::IdStrategy;
use crate::roles::normalize_role;

/// 전체 리소스 정책
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcePolicy {
    /// 리소스 이름(경로) → 정의
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
}

impl ResourcePolicy {
    /// YAML 파싱 + 정합성 검사
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let policy: ResourcePolicy = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    /// 리소스 조회
    pub fn get(&self, name: &str) -> Result<&ResourceDef> {
        self.resources.get(name).ok_or_else(|| Error::UnknownResource {
            name: name.to_string(),
        })
    }

    fn validate(&self) -> Result<()> {
        for (name, def) in &self.resources {
            let invalid = |message: String| Error::Policy {
                message: format!("resource '{}': {}", name, message),
            };

            if def.columns.is_empty() {
                return Err(invalid("columns must not be empty".to_string()));
            }
            if def.canonical_column(&def.key).is_none() {
                return Err(invalid(format!("key '{}' is not a listed column", def.key)));
            }
            for col in def.required.iter().chain(def.owner_column.iter()) {
                if def.canonical_column(col).is_none() {
                    return Err(invalid(format!("'{}' is not a listed column", col)));
                }
            }

            let needs_owner = [&def.select, &def.insert, &def.update, &def.delete]
                .into_iter()
                .flatten()
                .flat_map(|rules| rules.rules.iter())
                .any(|rule| rule.own_rows);
            if needs_owner && def.owner_column.is_none() {
                return Err(invalid("own_rows rule requires owner_column".to_string()));
            }
        }

        Ok(())
    }
}

/// 리소스 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    /// 테이블 이름
    pub table: String,

    /// PK 컬럼
    pub key: String,

    /// PK 생성 전략
    #[serde(default)]
    pub key_strategy: IdStrategy,

    /// 소유자 컬럼 (`own_rows` 규칙이 비교하는 컬럼)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_column: Option<String>,

    /// API로 노출되는 컬럼 목록 (조회/입력 모두 이 목록으로 제한)
    pub columns: Vec<String>,

    /// INSERT 시 필수 컬럼
    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default)]
    pub select: Option<OperationRules>,

    #[serde(default)]
    pub insert: Option<OperationRules>,

    #[serde(default)]
    pub update: Option<OperationRules>,

    #[serde(default)]
    pub delete: Option<OperationRules>,
}

impl ResourceDef {
    /// 특정 작업의 규칙 가져오기
    pub fn get_operation(&self, op: Operation) -> Option<&OperationRules> {
        match op {
            Operation::Select => self.select.as_ref(),
            Operation::Insert => self.insert.as_ref(),
            Operation::Update => self.update.as_ref(),
            Operation::Delete => self.delete.as_ref(),
        }
    }

    /// 대소문자 무시 컬럼 조회 → 정의된 표기
    pub fn canonical_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(|c| c.as_str())
    }

    /// 입력 컬럼 검증 후 정의된 표기로 변환
    pub fn resolve_columns<'a, I>(&self, names: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| {
                self.canonical_column(name)
                    .map(|c| c.to_string())
                    .ok_or_else(|| Error::validation(name, "unknown column"))
            })
            .collect()
    }

    /// INSERT 필수 컬럼 확인 (`present`는 정의된 표기)
    pub fn check_required(&self, present: &[String]) -> Result<()> {
        for col in &self.required {
            if !present.iter().any(|p| p == col) {
                return Err(Error::validation(col, "is required"));
            }
        }
        Ok(())
    }
}

/// 접근 규칙 (role 매칭 + 소유 행 제한)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRule {
    /// 허용되는 role 목록
    pub roles: Vec<RoleRequirement>,

    /// true면 owner_column = 호출자 subject 인 행으로 제한
    #[serde(default)]
    pub own_rows: bool,
}

/// Operation별 규칙 목록 (ordered array)
#[derive(Debug, Clone, Serialize)]
pub struct OperationRules {
    pub rules: Vec<AccessRule>,
}

/// 단일 규칙 객체 shorthand 허용
impl<'de> Deserialize<'de> for OperationRules {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct OperationRulesVisitor;

        impl<'de> Visitor<'de> for OperationRulesVisitor {
            type Value = OperationRules;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a sequence of access rules or a single access rule object")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut rules = Vec::new();
                while let Some(rule) = seq.next_element::<AccessRule>()? {
                    rules.push(rule);
                }
                Ok(OperationRules { rules })
            }

            fn visit_map<M>(self, map: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                let rule = AccessRule::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(OperationRules { rules: vec![rule] })
            }
        }

        deserializer.deserialize_any(OperationRulesVisitor)
    }
}

/// Role 요구사항
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// 인증 없이 허용
    Public,

    /// 인증된 사용자만 허용
    Authenticated,

    /// 특정 role 필요 (정규화된 이름)
    Role(String),
}

impl RoleRequirement {
    /// 문자열에서 파싱
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => RoleRequirement::Public,
            "authenticated" => RoleRequirement::Authenticated,
            _ => RoleRequirement::Role(normalize_role(s)),
        }
    }
}

impl Serialize for RoleRequirement {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RoleRequirement::Public => serializer.serialize_str("public"),
            RoleRequirement::Authenticated => serializer.serialize_str("authenticated"),
            RoleRequirement::Role(role) => serializer.serialize_str(role),
        }
    }
}

impl<'de> Deserialize<'de> for RoleRequirement {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(RoleRequirement::parse(value.as_str()))
    }
}

/// CRUD 작업 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}
