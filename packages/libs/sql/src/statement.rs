//! INSERT / UPDATE / DELETE / SELECT 문장 빌더
//!
//! 테이블 이름과 순서가 보존된 `컬럼 → 값` 목록으로 문장을 만듭니다.
//! 만들어진 [`Statement`]는 두 가지 형태를 함께 가집니다.
//!
//! - `sql`: `?` 플레이스홀더 + `params` (실행용)
//! - `inline`: 값이 [`escape`]로 직접 들어간 텍스트 (로그, 바인딩 미지원 저장소용)
//!
//! 식별자는 `[name]` 형태로 감싸며, 허용되지 않는 문자가 있으면 거부합니다.

use serde_json::{Map, Value};

use nursery_core::{Error, Result};

use crate::value::{escape, SqlValue};

/// 순서가 보존되는 컬럼 → 값 목록
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues(Vec<(String, SqlValue)>);

impl ColumnValues {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 컬럼 추가 (같은 컬럼이 있으면 값을 교체)
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column, value)),
        }
    }

    /// JSON 객체에서 생성 (키 순서 유지)
    pub fn from_json(object: &Map<String, Value>) -> Self {
        Self(
            object
                .iter()
                .map(|(k, v)| (k.clone(), SqlValue::from_json(v)))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn remove(&mut self, column: &str) -> Option<SqlValue> {
        let idx = self.0.iter().position(|(c, _)| c == column)?;
        Some(self.0.remove(idx).1)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for ColumnValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = ColumnValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

/// WHERE 조건 (컬럼 = 값, AND 결합)
///
/// 비어 있으면 모든 행과 일치합니다.
pub type Predicate = ColumnValues;

/// 문장 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// 결과 행을 돌려주는 문장인지
    pub fn returns_rows(&self) -> bool {
        matches!(self, StatementKind::Select)
    }
}

/// 완성된 문장
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub table: String,
    /// 플레이스홀더 SQL
    pub sql: String,
    /// 바인딩 값 (플레이스홀더 순서)
    pub params: Vec<SqlValue>,
    /// 이스케이프된 리터럴이 들어간 SQL
    pub inline: String,
}

/// WHERE 절 조각
#[derive(Debug, Clone, PartialEq)]
pub struct WhereFragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub inline: String,
}

/// 두 형태를 동시에 쓰는 작성기
#[derive(Default)]
struct SqlWriter {
    sql: String,
    inline: String,
    params: Vec<SqlValue>,
}

impl SqlWriter {
    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
        self.inline.push_str(text);
    }

    fn push_value(&mut self, value: &SqlValue) {
        self.sql.push('?');
        self.inline.push_str(&escape(value));
        self.params.push(value.clone());
    }

    fn push_predicate(&mut self, predicate: &Predicate) -> Result<()> {
        if predicate.is_empty() {
            self.push("1=1");
            return Ok(());
        }

        for (i, (column, value)) in predicate.iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            self.push(&quote_ident(column)?);
            if value.is_null() {
                self.push(" IS NULL");
            } else {
                self.push(" = ");
                self.push_value(value);
            }
        }
        Ok(())
    }

    fn finish(self, kind: StatementKind, table: &str) -> Statement {
        Statement {
            kind,
            table: table.to_string(),
            sql: self.sql,
            params: self.params,
            inline: self.inline,
        }
    }
}

/// 식별자 인용 (`[name]`)
///
/// 문자, 숫자, 밑줄, 공백만 허용합니다.
pub fn quote_ident(name: &str) -> Result<String> {
    let valid = !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == ' ');

    if !valid {
        return Err(Error::InvalidIdentifier {
            name: name.to_string(),
        });
    }

    Ok(format!("[{}]", name))
}

/// WHERE 절 조각 생성 (빈 조건은 `1=1`)
pub fn build_where_clause(predicate: &Predicate) -> Result<WhereFragment> {
    let mut w = SqlWriter::default();
    w.push_predicate(predicate)?;
    Ok(WhereFragment {
        sql: w.sql,
        params: w.params,
        inline: w.inline,
    })
}

/// `INSERT INTO [table] ([c1], ...) VALUES (v1, ...)`
pub fn build_insert(table: &str, values: &ColumnValues) -> Result<Statement> {
    if values.is_empty() {
        return Err(Error::EmptyPayload {
            what: format!("insert into {} has no columns", table),
        });
    }

    let mut w = SqlWriter::default();
    w.push("INSERT INTO ");
    w.push(&quote_ident(table)?);

    let columns = values
        .columns()
        .map(quote_ident)
        .collect::<Result<Vec<_>>>()?;
    w.push(" (");
    w.push(&columns.join(", "));
    w.push(") VALUES (");
    for (i, (_, value)) in values.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push_value(value);
    }
    w.push(")");

    Ok(w.finish(StatementKind::Insert, table))
}

/// `UPDATE [table] SET [c] = v, ... WHERE <predicate>`
///
/// 빈 조건은 거부합니다. 전체 행 갱신은 [`build_update_all`]을 사용합니다.
pub fn build_update(table: &str, values: &ColumnValues, predicate: &Predicate) -> Result<Statement> {
    if predicate.is_empty() {
        return Err(Error::EmptyPayload {
            what: format!("update of {} has no predicate", table),
        });
    }
    update_statement(table, values, predicate)
}

/// 조건 없는 전체 행 갱신 (`WHERE 1=1`)
pub fn build_update_all(table: &str, values: &ColumnValues) -> Result<Statement> {
    update_statement(table, values, &Predicate::new())
}

fn update_statement(table: &str, values: &ColumnValues, predicate: &Predicate) -> Result<Statement> {
    if values.is_empty() {
        return Err(Error::EmptyPayload {
            what: format!("update of {} has no columns", table),
        });
    }

    let mut w = SqlWriter::default();
    w.push("UPDATE ");
    w.push(&quote_ident(table)?);
    w.push(" SET ");
    for (i, (column, value)) in values.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push(&quote_ident(column)?);
        w.push(" = ");
        w.push_value(value);
    }
    w.push(" WHERE ");
    w.push_predicate(predicate)?;

    Ok(w.finish(StatementKind::Update, table))
}

/// `DELETE FROM [table] WHERE <predicate>`
///
/// 빈 조건은 거부합니다. 전체 삭제는 [`build_delete_all`]을 사용합니다.
pub fn build_delete(table: &str, predicate: &Predicate) -> Result<Statement> {
    if predicate.is_empty() {
        return Err(Error::EmptyPayload {
            what: format!("delete from {} has no predicate", table),
        });
    }
    delete_statement(table, predicate)
}

/// 조건 없는 전체 삭제 (`WHERE 1=1`)
pub fn build_delete_all(table: &str) -> Result<Statement> {
    delete_statement(table, &Predicate::new())
}

fn delete_statement(table: &str, predicate: &Predicate) -> Result<Statement> {
    let mut w = SqlWriter::default();
    w.push("DELETE FROM ");
    w.push(&quote_ident(table)?);
    w.push(" WHERE ");
    w.push_predicate(predicate)?;

    Ok(w.finish(StatementKind::Delete, table))
}

/// `SELECT [c1], ... FROM [table] WHERE <predicate>` (컬럼이 없으면 `*`)
pub fn build_select<S: AsRef<str>>(table: &str, columns: &[S], predicate: &Predicate) -> Result<Statement> {
    let mut w = SqlWriter::default();
    w.push("SELECT ");
    if columns.is_empty() {
        w.push("*");
    } else {
        let quoted = columns
            .iter()
            .map(|c| quote_ident(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        w.push(&quoted.join(", "));
    }
    w.push(" FROM ");
    w.push(&quote_ident(table)?);
    w.push(" WHERE ");
    w.push_predicate(predicate)?;

    Ok(w.finish(StatementKind::Select, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_scenario() {
        let stmt = build_update(
            "Orders",
            &ColumnValues::new().set("Status", "approved"),
            &Predicate::new().set("ID", 5i64),
        )
        .unwrap();

        assert_eq!(stmt.inline, "UPDATE [Orders] SET [Status] = 'approved' WHERE [ID] = 5");
        assert_eq!(stmt.sql, "UPDATE [Orders] SET [Status] = ? WHERE [ID] = ?");
        assert_eq!(stmt.params, vec![SqlValue::from("approved"), SqlValue::Int(5)]);
        assert_eq!(stmt.kind, StatementKind::Update);
    }

    #[test]
    fn test_insert_scenario() {
        let values = ColumnValues::new()
            .set("ID", "u1")
            .set("Email", "a@b.com")
            .set("IsActive", true);
        let stmt = build_insert("Users", &values).unwrap();

        assert_eq!(
            stmt.inline,
            "INSERT INTO [Users] ([ID], [Email], [IsActive]) VALUES ('u1', 'a@b.com', TRUE)"
        );
        assert_eq!(stmt.sql, "INSERT INTO [Users] ([ID], [Email], [IsActive]) VALUES (?, ?, ?)");
    }

    #[test]
    fn test_insert_positions_match_columns() {
        for n in 1..=8 {
            let values: ColumnValues = (0..n).map(|i| (format!("C{}", i), i as i64)).collect();
            let stmt = build_insert("T", &values).unwrap();

            assert_eq!(stmt.sql.matches('?').count(), n);
            assert_eq!(stmt.params.len(), n);
            let expected_cols = (0..n).map(|i| format!("[C{}]", i)).collect::<Vec<_>>().join(", ");
            assert!(stmt.sql.contains(&format!("({})", expected_cols)));
            assert_eq!(stmt.params, (0..n).map(|i| SqlValue::Int(i as i64)).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_null_predicate_uses_is_null() {
        let predicate = Predicate::new()
            .set("DeletedAt", SqlValue::Null)
            .set("Status", "open");
        let fragment = build_where_clause(&predicate).unwrap();

        assert_eq!(fragment.inline, "[DeletedAt] IS NULL AND [Status] = 'open'");
        assert_eq!(fragment.sql, "[DeletedAt] IS NULL AND [Status] = ?");
        assert!(!fragment.inline.contains("= NULL"));
        assert_eq!(fragment.params.len(), 1);
    }

    #[test]
    fn test_empty_predicate_where_is_match_all() {
        let fragment = build_where_clause(&Predicate::new()).unwrap();
        assert_eq!(fragment.inline, "1=1");
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn test_empty_payloads_rejected() {
        let values = ColumnValues::new().set("Status", "x");
        let pred = Predicate::new().set("ID", 1i64);

        assert!(matches!(build_insert("T", &ColumnValues::new()), Err(Error::EmptyPayload { .. })));
        assert!(matches!(build_update("T", &ColumnValues::new(), &pred), Err(Error::EmptyPayload { .. })));
        assert!(matches!(build_update("T", &values, &Predicate::new()), Err(Error::EmptyPayload { .. })));
        assert!(matches!(build_delete("T", &Predicate::new()), Err(Error::EmptyPayload { .. })));
    }

    #[test]
    fn test_explicit_bulk_operations() {
        let stmt = build_update_all("Notifications", &ColumnValues::new().set("IsRead", true)).unwrap();
        assert_eq!(stmt.inline, "UPDATE [Notifications] SET [IsRead] = TRUE WHERE 1=1");

        let stmt = build_delete_all("Notifications").unwrap();
        assert_eq!(stmt.inline, "DELETE FROM [Notifications] WHERE 1=1");
    }

    #[test]
    fn test_delete_and_select() {
        let pred = Predicate::new().set("ID", "p'1");
        let stmt = build_delete("Plants", &pred).unwrap();
        assert_eq!(stmt.inline, "DELETE FROM [Plants] WHERE [ID] = 'p''1'");

        let stmt = build_select("Plants", &["ID", "Name"], &pred).unwrap();
        assert_eq!(stmt.inline, "SELECT [ID], [Name] FROM [Plants] WHERE [ID] = 'p''1'");
        assert!(stmt.kind.returns_rows());

        let none: [&str; 0] = [];
        let stmt = build_select("Plants", &none, &Predicate::new()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM [Plants] WHERE 1=1");
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(quote_ident("Order Items").is_ok());
        for bad in ["", "  ", "Users]; DROP TABLE [Users", "a'b", "x;y", "t?"] {
            assert!(matches!(quote_ident(bad), Err(Error::InvalidIdentifier { .. })), "{bad}");
        }

        let values = ColumnValues::new().set("Bad]", 1i64);
        assert!(build_insert("T", &values).is_err());
    }

    #[test]
    fn test_set_replaces_existing_column() {
        let values = ColumnValues::new().set("A", 1i64).set("B", 2i64).set("A", 3i64);
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("A"), Some(&SqlValue::Int(3)));
        assert_eq!(values.columns().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
