//! Database Gateway
//!
//! 프로세스 전체에서 하나의 연결을 공유합니다.
//! 연결은 첫 사용 시 열리고 이후 재사용되며, 동시 요청은 이 연결에서 직렬화됩니다.
//!
//! 실행은 항상 `Statement::sql` + 바인딩 파라미터로 합니다.
//! `Statement::inline`은 운영 환경이 아닐 때 로그로만 남습니다.

use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteQueryResult,
    SqliteRow,
};
use sqlx::{Column, Row, Sqlite, Transaction, TypeInfo, ValueRef};

use base64::Engine;
use nursery_sql::{quote_ident, SqlValue, Statement};

/// 쓰기 문장 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

impl From<SqliteQueryResult> for ExecOutcome {
    fn from(result: SqliteQueryResult) -> Self {
        Self {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_rowid(),
        }
    }
}

/// 테이블 컬럼 정보
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

/// 단일 연결 Gateway
#[derive(Clone)]
pub struct Gateway {
    pool: SqlitePool,
    log_statements: bool,
}

impl Gateway {
    /// 파일 DB에 대한 Gateway (연결은 첫 사용 시 열림)
    pub fn open(path: &str, log_statements: bool) -> anyhow::Result<Self> {
        let options = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true)
        };

        Ok(Self::with_options(options, log_statements))
    }

    /// 메모리 DB (테스트용)
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap_or_else(|_| SqliteConnectOptions::new());
        Self::with_options(options, true)
    }

    fn with_options(options: SqliteConnectOptions, log_statements: bool) -> Self {
        // 연결 하나를 프로세스 수명 동안 유지
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy_with(options);

        Self {
            pool,
            log_statements,
        }
    }

    fn log(&self, stmt: &Statement) {
        if self.log_statements {
            tracing::debug!(table = %stmt.table, "{}", stmt.inline);
        }
    }

    /// 행을 돌려주는 문장 실행
    pub async fn query(&self, stmt: &Statement) -> Result<Vec<Map<String, Value>>, sqlx::Error> {
        self.log(stmt);
        let rows = bind_params(&stmt.sql, &stmt.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// 쓰기 문장 실행
    pub async fn execute(&self, stmt: &Statement) -> Result<ExecOutcome, sqlx::Error> {
        self.log(stmt);
        let result = bind_params(&stmt.sql, &stmt.params)
            .execute(&self.pool)
            .await?;
        Ok(result.into())
    }

    /// 이미 이스케이프된 SELECT 실행 (목록 조회)
    pub async fn query_sql(&self, sql: &str) -> Result<Vec<Map<String, Value>>, sqlx::Error> {
        if self.log_statements {
            tracing::debug!("{}", sql);
        }
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// 스키마 DDL 실행
    pub async fn execute_ddl(&self, ddl: &str) -> Result<(), sqlx::Error> {
        sqlx::query(ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// 연결 확인
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// 사용자 테이블 목록
    pub async fn table_names(&self) -> Result<Vec<String>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| row.try_get::<String, _>("name")).collect()
    }

    /// 테이블 컬럼 정보 (없는 테이블이면 None)
    pub async fn table_schema(&self, table: &str) -> Result<Option<Vec<ColumnSchema>>, sqlx::Error> {
        if quote_ident(table).is_err() {
            return Ok(None);
        }

        let rows = sqlx::query(
            r#"SELECT name, type, "notnull" AS not_null, dflt_value, pk FROM pragma_table_info(?)"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let columns = rows
            .iter()
            .map(|row| {
                Ok(ColumnSchema {
                    name: row.try_get("name")?,
                    data_type: row.try_get("type")?,
                    nullable: row.try_get::<i64, _>("not_null")? == 0,
                    default: row.try_get("dflt_value")?,
                    primary_key: row.try_get::<i64, _>("pk")? > 0,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(columns))
    }

    /// 트랜잭션 시작
    ///
    /// 트랜잭션이 끝날 때까지 연결을 점유하므로 그 사이에 `Gateway` 메서드를 호출하면 안 됩니다.
    pub async fn begin(&self) -> Result<GatewayTx, sqlx::Error> {
        let tx = self.pool.begin().await?;
        Ok(GatewayTx {
            tx,
            log_statements: self.log_statements,
        })
    }
}

/// Gateway 트랜잭션 (commit 없이 drop되면 rollback)
pub struct GatewayTx {
    tx: Transaction<'static, Sqlite>,
    log_statements: bool,
}

impl GatewayTx {
    fn log(&self, stmt: &Statement) {
        if self.log_statements {
            tracing::debug!(table = %stmt.table, tx = true, "{}", stmt.inline);
        }
    }

    pub async fn query(&mut self, stmt: &Statement) -> Result<Vec<Map<String, Value>>, sqlx::Error> {
        self.log(stmt);
        let rows = bind_params(&stmt.sql, &stmt.params)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    pub async fn execute(&mut self, stmt: &Statement) -> Result<ExecOutcome, sqlx::Error> {
        self.log(stmt);
        let result = bind_params(&stmt.sql, &stmt.params)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.into())
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

fn bind_params<'q>(sql: &'q str, params: &[SqlValue]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params.iter().fold(sqlx::query(sql), |query, param| match param {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Date(d) => query.bind(*d),
    })
}

fn row_to_json(row: &SqliteRow) -> Map<String, Value> {
    let mut obj = Map::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let declared = column.type_info().name().to_ascii_uppercase();
        obj.insert(column.name().to_string(), column_value(row, idx, &declared));
    }
    obj
}

fn column_value(row: &SqliteRow, idx: usize, declared: &str) -> Value {
    let stored = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(_) => return Value::Null,
    };

    // 저장된 값의 타입 기준으로 읽고, BOOLEAN 선언 컬럼만 bool로 변환
    match stored.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<i64, _>(idx)
            .ok()
            .map(|v| {
                if declared == "BOOLEAN" {
                    Value::Bool(v != 0)
                } else {
                    Value::Number(v.into())
                }
            }),
        "REAL" => row
            .try_get_unchecked::<f64, _>(idx)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(idx)
            .ok()
            .map(|bytes| Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))),
        _ => row
            .try_get_unchecked::<String, _>(idx)
            .ok()
            .map(Value::String),
    }
    .unwrap_or(Value::Null)
}
