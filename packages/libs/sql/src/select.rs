//! 목록 조회 SELECT 빌더
//!
//! 연산자 조건, 정렬, 페이지네이션이 필요한 목록 조회용입니다.
//! SeaQuery로 SQLite 방언 SQL을 생성하며 값은 SeaQuery가 이스케이프합니다.

use sea_query::{Expr, Iden, Order, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};
use serde_json::Value;

use crate::params::{ListParams, SortOrder, WhereClause, WhereOperator};
use crate::statement::Predicate;
use crate::value::SqlValue;

/// 동적 테이블/컬럼 식별자
#[derive(Debug, Clone)]
struct DynIden(String);

impl Iden for DynIden {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = write!(s, "{}", self.0);
    }
}

/// 목록 SELECT 빌더
pub struct SelectBuilder<'a> {
    table: &'a str,
    columns: &'a [String],
}

impl<'a> SelectBuilder<'a> {
    /// 새 빌더 생성
    ///
    /// `columns`는 조회할 컬럼 목록이며 이미 검증된 이름이어야 합니다.
    pub fn new(table: &'a str, columns: &'a [String]) -> Self {
        Self { table, columns }
    }

    /// SQL 생성
    ///
    /// # Arguments
    /// * `params` - 목록 파라미터 (정렬 컬럼은 검증된 이름)
    /// * `filter` - 검증된 WHERE 조건
    /// * `scope` - 추가 equality 조건 (소유 행 제한)
    pub fn build(&self, params: &ListParams, filter: &WhereClause, scope: &Predicate) -> String {
        let mut query = Query::select();
        query.from(DynIden(self.table.to_string()));

        for col in self.columns {
            query.column(self.col(col));
        }

        self.build_where(&mut query, filter);

        for (column, value) in scope.iter() {
            let cond = match value {
                SqlValue::Null => Expr::col(self.col(column)).is_null(),
                other => Expr::col(self.col(column)).eq(sql_value_to_expr(other)),
            };
            query.and_where(cond);
        }

        if let Some(order_by) = &params.order_by {
            let order = match params.order.unwrap_or_default() {
                SortOrder::Asc => Order::Asc,
                SortOrder::Desc => Order::Desc,
            };
            query.order_by(self.col(order_by), order);
        }

        query.limit(params.effective_limit());
        if let Some(offset) = params.offset {
            query.offset(offset);
        }

        query.to_string(SqliteQueryBuilder)
    }

    fn col(&self, column: &str) -> (DynIden, DynIden) {
        (DynIden(self.table.to_string()), DynIden(column.to_string()))
    }

    fn build_where(&self, query: &mut SelectStatement, where_clause: &WhereClause) {
        for (column, value) in &where_clause.0 {
            match value {
                Value::Null => {
                    query.and_where(Expr::col(self.col(column)).is_null());
                }
                Value::Object(obj) => {
                    self.build_operator_condition(query, column, obj);
                }
                other => {
                    query.and_where(Expr::col(self.col(column)).eq(value_to_expr(other)));
                }
            }
        }
    }

    fn build_operator_condition(
        &self,
        query: &mut SelectStatement,
        column: &str,
        obj: &serde_json::Map<String, Value>,
    ) {
        for (op_key, op_value) in obj {
            let Some(op) = WhereOperator::parse(op_key) else {
                continue;
            };
            let col = Expr::col(self.col(column));

            let cond = match op {
                WhereOperator::Eq if op_value.is_null() => col.is_null(),
                WhereOperator::Eq => col.eq(value_to_expr(op_value)),
                WhereOperator::Ne if op_value.is_null() => col.is_not_null(),
                WhereOperator::Ne => col.ne(value_to_expr(op_value)),
                WhereOperator::Gt => col.gt(value_to_expr(op_value)),
                WhereOperator::Gte => col.gte(value_to_expr(op_value)),
                WhereOperator::Lt => col.lt(value_to_expr(op_value)),
                WhereOperator::Lte => col.lte(value_to_expr(op_value)),
                WhereOperator::In | WhereOperator::NotIn => {
                    let Value::Array(arr) = op_value else {
                        continue;
                    };
                    let items: Vec<SimpleExpr> = arr.iter().map(value_to_expr).collect();
                    match (op, items.is_empty()) {
                        // 빈 IN은 아무 행과도 일치하지 않음
                        (WhereOperator::In, true) => Expr::cust("1=0"),
                        (_, true) => continue,
                        (WhereOperator::In, false) => col.is_in(items),
                        (_, false) => col.is_not_in(items),
                    }
                }
                WhereOperator::Like => match op_value.as_str() {
                    Some(pattern) => col.like(pattern),
                    None => continue,
                },
                // { "$null": false } 는 IS NOT NULL
                WhereOperator::IsNull | WhereOperator::IsNotNull => {
                    let want_null = op_value.as_bool().unwrap_or(true) == (op == WhereOperator::IsNull);
                    if want_null {
                        col.is_null()
                    } else {
                        col.is_not_null()
                    }
                }
            };

            query.and_where(cond);
        }
    }
}

/// serde_json::Value를 SeaQuery Expr로 변환
fn value_to_expr(value: &Value) -> SimpleExpr {
    sql_value_to_expr(&SqlValue::from_json(value))
}

fn sql_value_to_expr(value: &SqlValue) -> SimpleExpr {
    match value {
        SqlValue::Null => Expr::val(Option::<String>::None).into(),
        SqlValue::Bool(b) => Expr::val(*b).into(),
        SqlValue::Int(i) => Expr::val(*i).into(),
        SqlValue::Float(f) => Expr::val(*f).into(),
        SqlValue::Text(s) => Expr::val(s.as_str()).into(),
        SqlValue::Date(d) => Expr::val(d.format("%Y-%m-%d %H:%M:%S").to_string()).into(),
    }
}
