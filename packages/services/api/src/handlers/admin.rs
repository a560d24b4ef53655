//! 관리자용 스키마 조회
//!
//! - `GET /api/admin/tables`
//! - `GET /api/admin/tables/{table}`

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use nursery_core::roles::{require_role, Role};

use crate::error::{ApiError, Result};
use crate::middleware::CurrentIdentity;
use crate::state::AppState;

/// GET /api/admin/tables
pub async fn list_tables(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
) -> Result<Json<Value>> {
    require_role(identity.get(), Role::Manager.as_str())?;

    let tables = state.gateway.table_names().await?;
    Ok(Json(json!({ "data": tables, "meta": { "count": tables.len() } })))
}

/// GET /api/admin/tables/{table}
pub async fn table_schema(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Path(table): Path<String>,
) -> Result<Json<Value>> {
    require_role(identity.get(), Role::Manager.as_str())?;

    let columns = state
        .gateway
        .table_schema(&table)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("table '{}' not found", table)))?;

    Ok(Json(json!({ "data": { "table": table, "columns": columns } })))
}
