//! 주문 체크아웃 핸들러
//!
//! `POST /api/orders/checkout`
//!
//! 하나의 트랜잭션 안에서 가격/재고 확인, 주문 및 주문 항목 생성, 재고 차감을 수행합니다.
//! 중간에 실패하면 트랜잭션이 drop되어 전부 rollback됩니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use nursery_core::id::{IdGenerator, IdStrategy};
use nursery_core::roles::{has_any_role, require_any_role};
use nursery_core::Error;
use nursery_sql::{build_insert, build_select, build_update, ColumnValues, Predicate, SqlValue};

use crate::error::{ApiError, Result};
use crate::gateway::GatewayTx;
use crate::middleware::CurrentIdentity;
use crate::state::AppState;

/// 다른 고객 대신 주문할 수 있는 role
const STAFF_ROLES: &[&str] = &["manager", "employee"];

/// 식물 하나당 주문 가능한 최대 수량 (합친 뒤 기준)
const MAX_LINE_QUANTITY: i64 = 1_000_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub plant_id: String,
    pub quantity: i64,
}

/// 확인된 주문 항목
struct PricedLine {
    plant_id: String,
    quantity: i64,
    unit_price: f64,
    inventory_id: String,
    stock: i64,
}

/// POST /api/orders/checkout
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    identity: CurrentIdentity,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let caller = require_any_role(identity.get(), &["customer", "manager", "employee"])?;
    let is_staff = has_any_role(Some(caller), STAFF_ROLES);

    let customer_id = match req.customer_id {
        Some(id) if is_staff => id,
        Some(id) if id != caller.subject() => {
            return Err(Error::AuthorizationDenied {
                required: STAFF_ROLES.join(" or "),
            }
            .into());
        }
        _ => caller.subject().to_string(),
    };

    let items = merge_items(&req.items)?;

    let mut tx = state.gateway.begin().await?;

    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        lines.push(price_line(&mut tx, item).await?);
    }

    let total = lines
        .iter()
        .map(|l| l.unit_price * l.quantity as f64)
        .sum::<f64>();
    let total = (total * 100.0).round() / 100.0;

    let order_id = IdGenerator::generate(IdStrategy::Ulid)?;
    let now = chrono::Utc::now().naive_utc();

    let order = ColumnValues::new()
        .set("ID", order_id.as_str())
        .set("CustomerID", customer_id.as_str())
        .set("Status", "pending")
        .set("TotalAmount", total)
        .set("DeliveryAddress", req.delivery_address.as_deref())
        .set("OrderDate", SqlValue::Date(now));
    tx.execute(&build_insert("Orders", &order)?).await?;

    for line in &lines {
        let item = ColumnValues::new()
            .set("OrderID", order_id.as_str())
            .set("PlantID", line.plant_id.as_str())
            .set("Quantity", line.quantity)
            .set("UnitPrice", line.unit_price);
        tx.execute(&build_insert("OrderItems", &item)?).await?;

        // 읽은 수량이 그대로일 때만 차감
        let decrement = build_update(
            "Inventory",
            &ColumnValues::new()
                .set("Quantity", line.stock - line.quantity)
                .set("UpdatedAt", SqlValue::Date(now)),
            &Predicate::new()
                .set("ID", line.inventory_id.as_str())
                .set("Quantity", line.stock),
        )?;
        if tx.execute(&decrement).await?.rows_affected != 1 {
            return Err(ApiError::Conflict {
                message: format!("inventory for plant {} changed during checkout", line.plant_id),
            });
        }
    }

    let order_row = first_row(
        &mut tx,
        "Orders",
        &["ID", "CustomerID", "Status", "TotalAmount", "DeliveryAddress", "OrderDate"],
        Predicate::new().set("ID", order_id.as_str()),
    )
    .await?
    .ok_or_else(|| ApiError::Internal {
        message: format!("order {} not readable after insert", order_id),
    })?;

    let item_rows = tx
        .query(&build_select(
            "OrderItems",
            &["ID", "PlantID", "Quantity", "UnitPrice"],
            &Predicate::new().set("OrderID", order_id.as_str()),
        )?)
        .await?;

    tx.commit().await?;

    tracing::info!(
        order = %order_id,
        customer = %customer_id,
        items = lines.len(),
        total,
        "Order checked out"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": { "order": order_row, "items": item_rows } })),
    ))
}

/// 같은 식물은 합치고 수량 검증 (요청 순서 유지)
fn merge_items(items: &[CheckoutItem]) -> Result<Vec<CheckoutItem>> {
    if items.is_empty() {
        return Err(Error::validation("items", "at least one item is required").into());
    }

    let mut merged: Vec<CheckoutItem> = Vec::new();
    for item in items {
        if item.plant_id.trim().is_empty() {
            return Err(Error::validation("plantId", "must not be empty").into());
        }
        if item.quantity <= 0 {
            return Err(Error::validation("quantity", "must be positive").into());
        }
        let quantity = match merged.iter_mut().find(|m| m.plant_id == item.plant_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| Error::validation("quantity", "too large"))?;
                existing.quantity
            }
            None => {
                merged.push(item.clone());
                item.quantity
            }
        };
        if quantity > MAX_LINE_QUANTITY {
            return Err(Error::validation(
                "quantity",
                format!("at most {} per plant", MAX_LINE_QUANTITY),
            )
            .into());
        }
    }
    Ok(merged)
}

async fn price_line(tx: &mut GatewayTx, item: &CheckoutItem) -> Result<PricedLine> {
    let plant = first_row(
        tx,
        "Plants",
        &["ID", "Price"],
        Predicate::new().set("ID", item.plant_id.as_str()),
    )
    .await?
    .ok_or_else(|| Error::validation("plantId", format!("unknown plant: {}", item.plant_id)))?;

    let inventory = first_row(
        tx,
        "Inventory",
        &["ID", "Quantity"],
        Predicate::new().set("PlantID", item.plant_id.as_str()),
    )
    .await?;

    let (inventory_id, stock) = inventory
        .as_ref()
        .and_then(|row| Some((row.get("ID")?.as_str()?.to_string(), row.get("Quantity")?.as_i64()?)))
        .unwrap_or_default();

    if stock < item.quantity {
        return Err(Error::validation(
            "quantity",
            format!(
                "insufficient stock for plant {}: requested {}, available {}",
                item.plant_id, item.quantity, stock
            ),
        )
        .into());
    }

    Ok(PricedLine {
        plant_id: item.plant_id.clone(),
        quantity: item.quantity,
        unit_price: plant.get("Price").and_then(Value::as_f64).unwrap_or(0.0),
        inventory_id,
        stock,
    })
}

async fn first_row(
    tx: &mut GatewayTx,
    table: &str,
    columns: &[&str],
    predicate: Predicate,
) -> Result<Option<Map<String, Value>>> {
    let stmt = build_select(table, columns, &predicate)?;
    Ok(tx.query(&stmt).await?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::test_support::{call, login_as, test_state};

    async fn stock_plant(state: &std::sync::Arc<crate::state::AppState>, staff: &str, name: &str, price: f64, qty: i64) -> String {
        let (_, body) = call(
            state,
            Method::POST,
            "/api/plants",
            Some(staff),
            Some(json!({ "Name": name, "Price": price })),
        )
        .await;
        let plant_id = body["data"]["ID"].as_str().unwrap().to_string();

        let (status, _) = call(
            state,
            Method::POST,
            "/api/inventory",
            Some(staff),
            Some(json!({ "PlantID": plant_id, "Quantity": qty })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        plant_id
    }

    async fn stock_of(state: &std::sync::Arc<crate::state::AppState>, staff: &str, plant_id: &str) -> Value {
        let filter = format!("%7B%22PlantID%22%3A%22{plant_id}%22%7D");
        let (_, body) = call(state, Method::GET, &format!("/api/inventory?where={filter}"), Some(staff), None).await;
        body["data"][0]["Quantity"].clone()
    }

    #[tokio::test]
    async fn test_checkout_creates_order_and_decrements_stock() {
        let state = test_state().await;
        let (_, staff) = login_as(&state, "staff@nursery.test", &["employee"]).await;
        let (customer_id, customer) = login_as(&state, "buyer@nursery.test", &["customer"]).await;

        let fern = stock_plant(&state, &staff, "Fern", 4.25, 10).await;
        let ivy = stock_plant(&state, &staff, "Ivy", 3.0, 5).await;

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&customer),
            Some(json!({
                "deliveryAddress": "1 Garden Lane",
                "items": [
                    { "plantId": fern, "quantity": 2 },
                    { "plantId": ivy, "quantity": 1 },
                    { "plantId": fern, "quantity": 1 }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["order"]["CustomerID"], customer_id.as_str());
        assert_eq!(body["data"]["order"]["Status"], "pending");
        assert_eq!(body["data"]["order"]["TotalAmount"], 15.75);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

        assert_eq!(stock_of(&state, &staff, &fern).await, 7);
        assert_eq!(stock_of(&state, &staff, &ivy).await, 4);

        let (_, body) = call(&state, Method::GET, "/api/orders", Some(&customer), None).await;
        assert_eq!(body["meta"]["count"], 1);
    }

    #[tokio::test]
    async fn test_checkout_rolls_back_on_insufficient_stock() {
        let state = test_state().await;
        let (_, staff) = login_as(&state, "staff@nursery.test", &["employee"]).await;
        let (_, customer) = login_as(&state, "buyer@nursery.test", &["customer"]).await;

        let fern = stock_plant(&state, &staff, "Fern", 4.0, 10).await;
        let ivy = stock_plant(&state, &staff, "Ivy", 3.0, 1).await;

        let (status, body) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&customer),
            Some(json!({ "items": [ { "plantId": fern, "quantity": 2 }, { "plantId": ivy, "quantity": 3 } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        assert_eq!(stock_of(&state, &staff, &fern).await, 10);
        let (_, body) = call(&state, Method::GET, "/api/orders", Some(&staff), None).await;
        assert_eq!(body["meta"]["count"], 0);
    }

    #[tokio::test]
    async fn test_checkout_validation_and_roles() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, "buyer@nursery.test", &["customer"]).await;
        let (_, supplier) = login_as(&state, "vendor@nursery.test", &["vendor"]).await;

        let (status, _) = call(&state, Method::POST, "/api/orders/checkout", Some(&customer), Some(json!({ "items": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&customer),
            Some(json!({ "items": [ { "plantId": "ghost", "quantity": 1 } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&customer),
            Some(json!({ "customerId": "someone-else", "items": [ { "plantId": "p", "quantity": 1 } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&supplier),
            Some(json!({ "items": [ { "plantId": "p", "quantity": 1 } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&state, Method::POST, "/api/orders/checkout", None, Some(json!({ "items": [] }))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_checkout_rejects_oversized_merged_quantity() {
        let state = test_state().await;
        let (_, staff) = login_as(&state, "staff@nursery.test", &["employee"]).await;
        let (_, customer) = login_as(&state, "buyer@nursery.test", &["customer"]).await;
        let fern = stock_plant(&state, &staff, "Fern", 4.0, 10).await;

        let half = i64::MAX / 2 + 1;
        let (status, body) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&customer),
            Some(json!({ "items": [ { "plantId": fern, "quantity": half }, { "plantId": fern, "quantity": half } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = call(
            &state,
            Method::POST,
            "/api/orders/checkout",
            Some(&customer),
            Some(json!({ "items": [ { "plantId": fern, "quantity": i64::MAX } ] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(stock_of(&state, &staff, &fern).await, 10);
        let (_, body) = call(&state, Method::GET, "/api/orders", Some(&staff), None).await;
        assert_eq!(body["meta"]["count"], 0);
    }
}
