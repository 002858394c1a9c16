use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::subscription_plan::{self, PlanDuration},
    errors::ApiError,
    handlers::common::{created_response, success_response, validate_input},
    services::catalog::{CreatePlanInput, UpdatePlanInput},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/:id", get(get_plan).put(update_plan).delete(delete_plan))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Vec<String>,
    #[schema(value_type = String, example = "30.00")]
    pub price: Decimal,
    pub duration: PlanDuration,
    #[schema(value_type = String, example = "10.00")]
    pub discount_percent: Decimal,
    #[schema(value_type = String, example = "27.00")]
    pub discounted_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<subscription_plan::Model> for PlanResponse {
    fn from(model: subscription_plan::Model) -> Self {
        let description = model
            .description
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id: model.id,
            name: model.name,
            description,
            price: model.price,
            duration: model.duration,
            discount_percent: model.discount_percent,
            discounted_price: model.discounted_price,
            created_at: model.created_at,
        }
    }
}

/// Create a subscription plan (admin)
#[utoipa::path(
    post,
    path = "/api/v1/plans",
    request_body = CreatePlanInput,
    responses(
        (status = 201, description = "Plan created"),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Subscription plans"
)]
pub async fn create_plan(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePlanInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    validate_input(&payload)?;
    let plan = state.services.catalog.create_plan(payload).await?;
    Ok(created_response(PlanResponse::from(plan)))
}

/// List all plans
#[utoipa::path(
    get,
    path = "/api/v1/plans",
    responses((status = 200, description = "Plan list")),
    tag = "Subscription plans"
)]
pub async fn list_plans(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let plans = state.services.catalog.list_plans().await?;
    let body: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
    Ok(success_response(body))
}

/// Fetch one plan
#[utoipa::path(
    get,
    path = "/api/v1/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Subscription plans"
)]
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.services.catalog.find_plan(id).await?;
    Ok(success_response(PlanResponse::from(plan)))
}

/// Update a plan (admin); description entries are merged, not replaced
#[utoipa::path(
    put,
    path = "/api/v1/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan id")),
    request_body = UpdatePlanInput,
    responses(
        (status = 200, description = "Plan updated"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Subscription plans"
)]
pub async fn update_plan(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanInput>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    validate_input(&payload)?;
    let plan = state.services.catalog.update_plan(id, payload).await?;
    Ok(success_response(PlanResponse::from(plan)))
}

/// Delete a plan (admin)
#[utoipa::path(
    delete,
    path = "/api/v1/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Subscription plans"
)]
pub async fn delete_plan(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    state.services.catalog.delete_plan(id).await?;
    Ok(success_response(serde_json::json!({ "deleted": id })))
}
