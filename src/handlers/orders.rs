use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::{
        order::{self, OrderStatus, OrderType},
        order_item::{self, ItemKind},
    },
    errors::{ApiError, ServiceError},
    handlers::common::{
        created_with_message, success_response, PaginationMeta, PaginationParams,
    },
    services::{orders::OrderWithItems, pricing::LineItemRequest},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/mine", get(my_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of PENDING, APPROVED, OUT_FOR_DELIVERY, DELIVERED, CANCELLED, REFUNDED
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "5.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "10.00")]
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(value_type = String, example = "40.00")]
    pub total_amount: Decimal,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub paid: bool,
    pub payment_id: Option<String>,
    pub end_of_subscription: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            item_kind: model.item_kind,
            item_id: model.item_id,
            name: model.name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            line_total: model.line_total,
        }
    }
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            total_amount: model.total_amount,
            order_type: model.order_type,
            status: model.status,
            paid: model.paid,
            payment_id: model.payment_id,
            end_of_subscription: model.end_of_subscription,
            created_at: model.created_at,
            updated_at: model.updated_at,
            items: None,
        }
    }
}

impl From<OrderWithItems> for OrderResponse {
    fn from(value: OrderWithItems) -> Self {
        let mut response = Self::from(value.order);
        response.items = Some(
            value
                .items
                .into_iter()
                .map(OrderItemResponse::from)
                .collect(),
        );
        response
    }
}

/// Place an order for the authenticated customer
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed"),
        (status = 400, description = "Invalid items or incomplete shipping profile", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.services.customers.find(user.user_id).await?;
    let order = state
        .services
        .orders
        .create_order(&customer, &payload.items)
        .await?;
    Ok(created_with_message(
        OrderResponse::from(order),
        "Order placed successfully! Please pay for order verification",
    ))
}

/// List the authenticated customer's own orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders/mine",
    responses((status = 200, description = "Order list")),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_for_customer(user.user_id)
        .await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(success_response(body))
}

#[derive(Debug, Serialize, ToSchema)]
struct OrderListResponse {
    orders: Vec<OrderResponse>,
    pagination: PaginationMeta,
}

/// List all orders, paginated (admin)
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated order list"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let page = state
        .services
        .orders
        .list_orders(params.page, params.per_page)
        .await?;
    let body = OrderListResponse {
        orders: page.orders.into_iter().map(OrderResponse::from).collect(),
        pagination: PaginationMeta::new(page.page, page.per_page, page.total),
    };
    Ok(success_response(body))
}

/// Fetch one order with its line items (owner or admin)
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.services.orders.get_order(id).await?;
    if order.order.customer_id != user.user_id && !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "you are not authorized to view this order".to_string(),
        )
        .into());
    }
    Ok(success_response(OrderResponse::from(order)))
}

/// Set an order's status (admin)
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status value", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let status = OrderStatus::from_str(&payload.status).map_err(|_| {
        ServiceError::InvalidArgument(format!("unknown order status: {}", payload.status))
    })?;
    let updated = state.services.orders.update_status(id, status).await?;
    Ok(success_response(OrderResponse::from(updated)))
}
