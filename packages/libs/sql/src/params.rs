//! 목록 조회 파라미터
//!
//! `GET /api/{resource}` 쿼리 문자열을 파싱하고 검증합니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use nursery_core::{Error, Result};

/// 기본 페이지 크기
pub const DEFAULT_LIMIT: u64 = 100;

/// 최대 페이지 크기
pub const MAX_LIMIT: u64 = 500;

/// 목록 조회 파라미터 (쿼리 문자열)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// WHERE 조건 (JSON 객체 문자열)
    #[serde(default, rename = "where")]
    pub filter: Option<String>,

    /// 정렬 컬럼
    #[serde(default)]
    pub order_by: Option<String>,

    /// 정렬 순서
    #[serde(default)]
    pub order: Option<SortOrder>,

    #[serde(default)]
    pub limit: Option<u64>,

    #[serde(default)]
    pub offset: Option<u64>,
}

impl ListParams {
    /// WHERE 조건 파싱
    pub fn where_clause(&self) -> Result<WhereClause> {
        let Some(raw) = self.filter.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(WhereClause::empty());
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(WhereClause(map)),
            Ok(_) => Err(Error::validation("where", "must be a JSON object")),
            Err(e) => Err(Error::validation("where", e.to_string())),
        }
    }

    /// 적용할 LIMIT (기본값/상한 반영)
    pub fn effective_limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// 정렬 순서
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// WHERE 조건
///
/// JSON 객체로 표현되며, 다양한 연산자를 지원합니다.
///
/// # 예시
///
/// ```json
/// { "Status": "active" }                    // Status = 'active'
/// { "Price": { "$gt": 10 } }                // Price > 10
/// { "Category": { "$in": ["a", "b"] } }     // Category IN ('a', 'b')
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhereClause(pub Map<String, Value>);

impl WhereClause {
    /// 빈 WHERE 절
    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 단순 equality 조건 추가
    pub fn eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.0.insert(column.into(), value);
        self
    }

    /// 컬럼 이름과 연산자 검증
    ///
    /// `resolve`는 입력 컬럼을 정의된 표기로 바꾸거나 거부합니다.
    /// 결과는 정의된 표기의 컬럼을 키로 갖는 새 WHERE 절입니다.
    pub fn validate<F>(&self, resolve: F) -> Result<WhereClause>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = Map::new();
        for (key, value) in &self.0 {
            let column = resolve(key).ok_or_else(|| Error::validation(key, "unknown column"))?;

            match value {
                Value::Object(ops) => {
                    for (op, operand) in ops {
                        let parsed = WhereOperator::parse(op).ok_or_else(|| {
                            Error::validation(key, format!("invalid operator: {}", op))
                        })?;
                        parsed.check_operand(key, operand)?;
                    }
                }
                Value::Array(_) => {
                    return Err(Error::validation(key, "use $in for a list of values"));
                }
                _ => {}
            }

            out.insert(column, value.clone());
        }
        Ok(WhereClause(out))
    }
}

/// WHERE 조건 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOperator {
    /// 같음 (기본)
    Eq,
    /// 같지 않음
    Ne,
    /// 보다 큼
    Gt,
    /// 보다 크거나 같음
    Gte,
    /// 보다 작음
    Lt,
    /// 보다 작거나 같음
    Lte,
    /// 포함 (IN)
    In,
    /// 미포함 (NOT IN)
    NotIn,
    /// LIKE 패턴
    Like,
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
}

impl WhereOperator {
    /// 문자열에서 파싱 ($gt, $in 등)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "$eq" => Some(WhereOperator::Eq),
            "$ne" => Some(WhereOperator::Ne),
            "$gt" => Some(WhereOperator::Gt),
            "$gte" => Some(WhereOperator::Gte),
            "$lt" => Some(WhereOperator::Lt),
            "$lte" => Some(WhereOperator::Lte),
            "$in" => Some(WhereOperator::In),
            "$nin" | "$notIn" => Some(WhereOperator::NotIn),
            "$like" => Some(WhereOperator::Like),
            "$null" | "$isNull" => Some(WhereOperator::IsNull),
            "$notNull" | "$isNotNull" => Some(WhereOperator::IsNotNull),
            _ => None,
        }
    }

    /// 피연산자 형태 검증
    ///
    /// `$in`/`$nin`은 배열, `$like`는 문자열, `$null`/`$notNull`은 bool,
    /// 나머지 비교 연산자는 스칼라 값이어야 합니다.
    pub fn check_operand(&self, column: &str, operand: &Value) -> Result<()> {
        let ok = match self {
            WhereOperator::In | WhereOperator::NotIn => operand.is_array(),
            WhereOperator::Like => operand.is_string(),
            WhereOperator::IsNull | WhereOperator::IsNotNull => operand.is_boolean(),
            WhereOperator::Eq | WhereOperator::Ne => !operand.is_array() && !operand.is_object(),
            WhereOperator::Gt | WhereOperator::Gte | WhereOperator::Lt | WhereOperator::Lte => {
                operand.is_number() || operand.is_string()
            }
        };
        if ok {
            return Ok(());
        }

        let expected = match self {
            WhereOperator::In | WhereOperator::NotIn => "an array",
            WhereOperator::Like => "a string pattern",
            WhereOperator::IsNull | WhereOperator::IsNotNull => "true or false",
            WhereOperator::Eq | WhereOperator::Ne => "a scalar value",
            _ => "a number or string",
        };
        Err(Error::validation(column, format!("operand must be {}", expected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(allowed: &'static [&'static str]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            allowed
                .iter()
                .find(|c| c.eq_ignore_ascii_case(name))
                .map(|c| c.to_string())
        }
    }

    #[test]
    fn test_where_clause_validation() {
        let where_clause = WhereClause::empty()
            .eq("status", Value::String("active".to_string()))
            .eq("Price", serde_json::json!({ "$gt": 10 }));

        let validated = where_clause.validate(resolver(&["Status", "Price"])).unwrap();
        assert!(validated.0.contains_key("Status"));

        let unknown = WhereClause::empty().eq("Secret", Value::Null);
        assert!(unknown.validate(resolver(&["Status"])).is_err());

        let bad_op = WhereClause::empty().eq("Price", serde_json::json!({ "$regex": "x" }));
        assert!(bad_op.validate(resolver(&["Price"])).is_err());
    }

    #[test]
    fn test_where_operand_shapes() {
        let check = |filter: Value| {
            WhereClause::empty()
                .eq("Category", filter)
                .validate(resolver(&["Category"]))
        };

        assert!(matches!(check(serde_json::json!({ "$in": "indoor" })), Err(Error::Validation { .. })));
        assert!(matches!(check(serde_json::json!({ "$nin": 3 })), Err(Error::Validation { .. })));
        assert!(matches!(check(serde_json::json!({ "$like": 5 })), Err(Error::Validation { .. })));
        assert!(matches!(check(serde_json::json!({ "$null": "yes" })), Err(Error::Validation { .. })));
        assert!(matches!(check(serde_json::json!({ "$notNull": 1 })), Err(Error::Validation { .. })));
        assert!(matches!(check(serde_json::json!({ "$gt": [1] })), Err(Error::Validation { .. })));
        assert!(matches!(check(serde_json::json!(["indoor", "outdoor"])), Err(Error::Validation { .. })));

        assert!(check(serde_json::json!({ "$in": ["indoor"], "$like": "%fern%" })).is_ok());
        assert!(check(serde_json::json!({ "$null": false })).is_ok());
        assert!(check(serde_json::json!({ "$ne": null })).is_ok());
    }

    #[test]
    fn test_where_operator_parsing() {
        assert_eq!(WhereOperator::parse("$gt"), Some(WhereOperator::Gt));
        assert_eq!(WhereOperator::parse("$in"), Some(WhereOperator::In));
        assert_eq!(WhereOperator::parse("$unknown"), None);
    }

    #[test]
    fn test_params_parsing() {
        let params = ListParams {
            filter: Some(r#"{ "Status": "active" }"#.to_string()),
            limit: Some(10_000),
            ..Default::default()
        };

        assert_eq!(params.where_clause().unwrap().0.len(), 1);
        assert_eq!(params.effective_limit(), MAX_LIMIT);
        assert_eq!(ListParams::default().effective_limit(), DEFAULT_LIMIT);

        let not_object = ListParams {
            filter: Some("[1,2]".to_string()),
            ..Default::default()
        };
        assert!(matches!(not_object.where_clause(), Err(Error::Validation { .. })));
    }
}
