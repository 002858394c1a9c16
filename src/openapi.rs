use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mealkit API",
        version = "0.1.0",
        description = r#"
Order and subscription backend for a meal-kit shop.

Customers browse products and subscription plans, place orders, and pay
through a hosted payment-gateway checkout session. Payment confirmation
approves the order and, for subscription-bearing orders, stamps the end of
the subscription period.

All endpoints except the catalog reads and the payment webhook require a
JWT bearer token:

```
Authorization: Bearer <token>
```

Error responses share one shape:

```json
{
  "success": false,
  "error": "Not Found",
  "message": "Order ... not found",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Product catalog"),
        (name = "Subscription plans", description = "Subscription plan catalog"),
        (name = "Orders", description = "Order placement and lifecycle"),
        (name = "Checkout", description = "Payment-gateway checkout sessions"),
        (name = "Webhooks", description = "Inbound payment-gateway events")
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::plans::list_plans,
        crate::handlers::plans::get_plan,
        crate::handlers::plans::create_plan,
        crate::handlers::plans::update_plan,
        crate::handlers::plans::delete_plan,
        crate::handlers::orders::create_order,
        crate::handlers::orders::my_orders,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::checkout::create_session,
        crate::handlers::checkout::confirm_payment,
        crate::handlers::payment_webhooks::payment_webhook,
    ),
    components(
        schemas(
            crate::handlers::products::ProductResponse,
            crate::handlers::plans::PlanResponse,
            crate::handlers::orders::OrderResponse,
            crate::handlers::orders::OrderItemResponse,
            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::UpdateStatusRequest,
            crate::handlers::checkout::CreateSessionRequest,
            crate::handlers::checkout::ConfirmPaymentRequest,
            crate::services::catalog::CreateProductInput,
            crate::services::catalog::UpdateProductInput,
            crate::services::catalog::CreatePlanInput,
            crate::services::catalog::UpdatePlanInput,
            crate::services::checkout::CheckoutRedirect,
            crate::services::pricing::LineItemRequest,
            crate::entities::order::OrderStatus,
            crate::entities::order::OrderType,
            crate::entities::order_item::ItemKind,
            crate::entities::subscription_plan::PlanDuration,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
