//! Order API endpoints.
//!
//! Translates HTTP requests into kitchen operations. Durations are
//! exchanged in seconds at this boundary.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dispatch_kitchen::{Order, OrderSnapshot, OrderState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Create order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(create_order).get(list_orders))
        .route("/order/{id}", get(get_order).post(update_order))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create a new order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Menu item name.
    pub name: String,

    /// Temperature category.
    pub temp: String,

    /// Maximum lifetime once ready, in seconds.
    pub shelf_life: f64,

    /// Intrinsic decay rate per second.
    pub decay_rate: f64,
}

/// Response for a created order.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    #[serde(rename = "orderID")]
    pub order_id: String,
}

/// Request to advance an order's state.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    /// Target state: ready, enroute or pickedup.
    pub state: String,
}

/// Rendered order representation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub name: String,
    pub state: String,
    pub shelf: String,
    pub shelf_life: f64,
    pub value: f64,
    pub normal: f64,
    pub decay: f64,
    pub age: f64,
}

impl From<OrderSnapshot> for OrderResponse {
    fn from(snapshot: OrderSnapshot) -> Self {
        Self {
            order_id: snapshot.id.to_string(),
            name: snapshot.name,
            state: snapshot.state.to_string(),
            shelf: snapshot.shelf.unwrap_or_default(),
            shelf_life: snapshot.shelf_life,
            value: snapshot.value,
            normal: snapshot.normalized_value,
            decay: snapshot.decayed,
            age: snapshot.age,
        }
    }
}

/// Response for listing orders.
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !req.shelf_life.is_finite() || req.shelf_life <= 0.0 {
        return Err(ApiError::bad_request(
            "invalid_shelf_life",
            "shelfLife must be a positive number of seconds",
        ));
    }
    if !req.decay_rate.is_finite() || req.decay_rate < 0.0 {
        return Err(ApiError::bad_request(
            "invalid_decay_rate",
            "decayRate must be non-negative",
        ));
    }

    let order = state.kitchen().new_order(
        req.name,
        req.temp,
        Duration::from_secs_f64(req.shelf_life),
        req.decay_rate,
    );
    state.kitchen().create_order(&order).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order_id: order.id().to_string(),
        }),
    ))
}

async fn list_orders(State(state): State<AppState>) -> Json<ListOrdersResponse> {
    let orders = state.kitchen().get_orders().await;
    let mut rendered = Vec::with_capacity(orders.len());
    for order in orders {
        rendered.push(order.snapshot().await.into());
    }
    Json(ListOrdersResponse { orders: rendered })
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = lookup(&state, &id).await?;
    Ok(Json(order.snapshot().await.into()))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = lookup(&state, &id).await?;
    match OrderState::from_str(&req.state.to_lowercase()) {
        Some(OrderState::Ready) => state.kitchen().set_order_ready(&order).await?,
        Some(OrderState::Enroute) => state.kitchen().set_order_enroute(&order).await?,
        Some(OrderState::PickedUp) => state.kitchen().set_order_picked_up(&order).await?,
        _ => {
            return Err(ApiError::bad_request(
                "invalid_state",
                format!("cannot request transition to {:?}", req.state),
            ))
        }
    }
    Ok(Json(order.snapshot().await.into()))
}

/// Resolve an order id. Unparseable and unknown ids both read as absent.
async fn lookup(state: &AppState, id: &str) -> Result<Arc<Order>, ApiError> {
    let not_found = || ApiError::not_found("unknown_order", format!("no order with id {id}"));
    let id: Uuid = id.parse().map_err(|_| not_found())?;
    state.kitchen().get_order(id).await.ok_or_else(not_found)
}
