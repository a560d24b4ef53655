//! 리소스 CRUD 핸들러
//!
//! `GET/POST /api/{resource}`, `GET/PUT/DELETE /api/{resource}/{id}`
//!
//! 모든 요청은 정책 평가 → 입력 검증 → 문장 생성 → Gateway 실행 순서로 처리됩니다.
//! 소유 행 규칙이 적용되면 소유자 컬럼 조건이 문장에 추가됩니다.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};

use nursery_core::auth::Identity;
use nursery_core::id::IdGenerator;
use nursery_core::policy::{Operation, PolicyEvaluator, ResourceDef, RowScope};
use nursery_core::Error;
use nursery_sql::{
    build_delete, build_insert, build_select, build_update, ColumnValues, ListParams, Predicate,
    SelectBuilder, SqlValue,
};

use crate::error::{ApiError, Result};
use crate::middleware::CurrentIdentity;
use crate::state::AppState;

/// GET /api/{resource}
pub async fn list(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Path(resource): Path<String>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(mut params) = params.map_err(|e| Error::validation("query", e.body_text()))?;
    let def = state.policy.get(&resource)?;
    let scope = authorize(&state, &resource, Operation::Select, identity.get())?;

    let filter = params
        .where_clause()?
        .validate(|name| def.canonical_column(name).map(str::to_string))?;

    if let Some(order_by) = params.order_by.take() {
        let column = def
            .canonical_column(&order_by)
            .ok_or_else(|| Error::validation("order_by", format!("unknown column: {}", order_by)))?;
        params.order_by = Some(column.to_string());
    }

    let scope_predicate = scope_predicate(&scope);
    let sql = SelectBuilder::new(&def.table, &def.columns).build(&params, &filter, &scope_predicate);
    let rows = state.gateway.query_sql(&sql).await?;

    Ok(Json(json!({
        "data": rows,
        "meta": {
            "count": rows.len(),
            "limit": params.effective_limit(),
            "offset": params.offset.unwrap_or(0),
        }
    })))
}

/// GET /api/{resource}/{id}
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let def = state.policy.get(&resource)?;
    let scope = authorize(&state, &resource, Operation::Select, identity.get())?;

    let predicate = key_predicate(def, &id, &scope)?;
    let row = fetch_row(&state, def, &predicate)
        .await?
        .ok_or_else(|| not_found(&resource, &id))?;

    Ok(Json(json!({ "data": row })))
}

/// POST /api/{resource}
pub async fn create(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let def = state.policy.get(&resource)?;
    let scope = authorize(&state, &resource, Operation::Insert, identity.get())?;
    let mut values = body_values(&resource, def, body)?;

    let strategy = def.key_strategy;
    let has_key = values.get(&def.key).is_some();
    if strategy.server_generates() && !has_key {
        values.insert(def.key.as_str(), IdGenerator::generate(strategy)?);
    } else if strategy.is_integer() && has_key {
        return Err(Error::validation(&def.key, "is generated by the database").into());
    } else if strategy.client_provides() && !has_key {
        return Err(Error::validation(&def.key, "is required").into());
    }

    // 소유 행 규칙이면 소유자 컬럼은 호출자 subject로 고정
    if let RowScope::Owned { column, subject } = &scope {
        let owner = SqlValue::from(subject.as_str());
        if values.get(column).is_some_and(|v| *v != owner) {
            return Err(Error::validation(column, "must be the caller's own id").into());
        }
        values.insert(column.as_str(), owner);
    }

    let present: Vec<String> = values.columns().map(str::to_string).collect();
    def.check_required(&present)?;

    let outcome = state.gateway.execute(&build_insert(&def.table, &values)?).await?;

    let key = match values.get(&def.key) {
        Some(value) => value.clone(),
        None => SqlValue::Int(outcome.last_insert_id),
    };
    tracing::info!(resource = %resource, key = ?key, "Row created");

    let row = fetch_row(&state, def, &Predicate::new().set(def.key.as_str(), key))
        .await?
        .ok_or_else(|| ApiError::Internal {
            message: format!("{} row not readable after insert", resource),
        })?;

    Ok((StatusCode::CREATED, Json(json!({ "data": row }))))
}

/// PUT /api/{resource}/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let def = state.policy.get(&resource)?;
    let scope = authorize(&state, &resource, Operation::Update, identity.get())?;
    let mut values = body_values(&resource, def, body)?;

    let key = key_value(def, &id)?;
    if let Some(sent) = values.remove(&def.key) {
        if sent != key {
            return Err(Error::validation(&def.key, "cannot be changed").into());
        }
    }

    if let RowScope::Owned { column, subject } = &scope {
        if let Some(value) = values.get(column) {
            if *value != SqlValue::from(subject.as_str()) {
                return Err(Error::validation(column, "cannot be reassigned").into());
            }
        }
    }

    if values.is_empty() {
        return Err(Error::EmptyPayload {
            what: format!("update of {} has no columns besides the key", resource),
        }
        .into());
    }

    let predicate = key_predicate(def, &id, &scope)?;
    let outcome = state
        .gateway
        .execute(&build_update(&def.table, &values, &predicate)?)
        .await?;

    if outcome.rows_affected == 0 {
        return Err(not_found(&resource, &id));
    }

    let row = fetch_row(&state, def, &Predicate::new().set(def.key.as_str(), key))
        .await?
        .ok_or_else(|| not_found(&resource, &id))?;

    Ok(Json(json!({ "data": row })))
}

/// DELETE /api/{resource}/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let def = state.policy.get(&resource)?;
    let scope = authorize(&state, &resource, Operation::Delete, identity.get())?;

    let predicate = key_predicate(def, &id, &scope)?;
    let outcome = state
        .gateway
        .execute(&build_delete(&def.table, &predicate)?)
        .await?;

    if outcome.rows_affected == 0 {
        return Err(not_found(&resource, &id));
    }

    tracing::info!(resource = %resource, id = %id, "Row deleted");
    Ok(Json(json!({ "data": { "id": id, "deleted": true } })))
}

fn authorize(
    state: &AppState,
    resource: &str,
    op: Operation,
    identity: Option<&Identity>,
) -> Result<RowScope> {
    let scope = PolicyEvaluator::new(&state.policy).evaluate(resource, op, identity)?;
    tracing::debug!(resource, op = op.as_str(), scope = ?scope, "Access granted");
    Ok(scope)
}

fn not_found(resource: &str, id: &str) -> ApiError {
    ApiError::not_found(format!("{} '{}' not found", resource, id))
}

/// 요청 본문 → 정의된 표기의 컬럼 값
fn body_values(resource: &str, def: &ResourceDef, body: Value) -> Result<ColumnValues> {
    let Value::Object(object) = body else {
        return Err(Error::validation("body", "must be a JSON object").into());
    };
    if object.is_empty() {
        return Err(Error::EmptyPayload {
            what: format!("{} body has no columns", resource),
        }
        .into());
    }

    let columns = def.resolve_columns(object.keys().map(String::as_str))?;
    Ok(columns
        .into_iter()
        .zip(object.values())
        .map(|(column, value)| (column, SqlValue::from_json(value)))
        .collect())
}

/// 경로의 id → 키 값 (정수 키는 숫자로)
fn key_value(def: &ResourceDef, id: &str) -> Result<SqlValue> {
    if def.key_strategy.is_integer() {
        return id
            .parse::<i64>()
            .map(SqlValue::Int)
            .map_err(|_| Error::validation(&def.key, "must be an integer").into());
    }
    Ok(SqlValue::from(id))
}

fn scope_predicate(scope: &RowScope) -> Predicate {
    match scope {
        RowScope::All => Predicate::new(),
        RowScope::Owned { column, subject } => Predicate::new().set(column.as_str(), subject.as_str()),
    }
}

/// 키 + 소유 범위 조건
fn key_predicate(def: &ResourceDef, id: &str, scope: &RowScope) -> Result<Predicate> {
    let mut predicate = Predicate::new().set(def.key.as_str(), key_value(def, id)?);

    if let RowScope::Owned { column, subject } = scope {
        let owner = SqlValue::from(subject.as_str());
        // 소유자 컬럼이 키 자체인 경우 다른 키는 보이지 않는 행
        if predicate.get(column).is_some_and(|v| *v != owner) {
            return Err(ApiError::not_found(format!("'{}' not found", id)));
        }
        predicate.insert(column.as_str(), owner);
    }

    Ok(predicate)
}

async fn fetch_row(
    state: &AppState,
    def: &ResourceDef,
    predicate: &Predicate,
) -> Result<Option<Map<String, Value>>> {
    let stmt = build_select(&def.table, &def.columns, predicate)?;
    Ok(state.gateway.query(&stmt).await?.into_iter().next())
}
