//! SQL 값과 리터럴 이스케이프
//!
//! [`escape`]는 값이 문장 텍스트에 들어가는 유일한 경로입니다.
//! 실행 시에는 같은 값이 바인딩 파라미터로 전달됩니다.

use chrono::NaiveDateTime;
use serde_json::Value;

/// 문장에 들어가는 값
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// serde_json::Value에서 변환
    ///
    /// 배열/객체는 JSON 문자열로 저장합니다.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::Float(f)
                } else {
                    SqlValue::Text(n.to_string())
                }
            }
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Int(i)
    }
}

impl From<i32> for SqlValue {
    fn from(i: i32) -> Self {
        SqlValue::Int(i64::from(i))
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Float(f)
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(d: NaiveDateTime) -> Self {
        SqlValue::Date(d)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// 값 → SQL 리터럴
///
/// - null → `NULL`
/// - 숫자 → 따옴표 없는 숫자 (유한하지 않은 실수는 `NULL`)
/// - bool → `TRUE` / `FALSE`
/// - 날짜 → `#YYYY-MM-DD HH:MM:SS#`
/// - 문자열 → 작은따옴표, 내부 따옴표는 두 번
pub fn escape(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(true) => "TRUE".to_string(),
        SqlValue::Bool(false) => "FALSE".to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) if f.is_finite() => f.to_string(),
        SqlValue::Float(_) => "NULL".to_string(),
        SqlValue::Date(d) => format!("#{}#", d.format("%Y-%m-%d %H:%M:%S")),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}
