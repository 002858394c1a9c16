pub mod checkout;
pub mod common;
pub mod orders;
pub mod payment_webhooks;
pub mod plans;
pub mod products;

use std::sync::Arc;

use axum::Router;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    gateway::PaymentGateway,
    services::{
        catalog::CatalogService,
        checkout::{CheckoutConfig, CheckoutService},
        customers::CustomerDirectory,
        orders::OrderService,
        payments::PaymentConfirmationService,
        pricing::PricingResolver,
    },
    AppState,
};

/// Business-logic layer shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub customers: CustomerDirectory,
    pub orders: OrderService,
    pub checkout: CheckoutService,
    pub payments: PaymentConfirmationService,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        gateway: Arc<dyn PaymentGateway>,
        config: &AppConfig,
    ) -> Self {
        let catalog = CatalogService::new(db.clone(), event_sender.clone());
        let customers = CustomerDirectory::new(db.clone());
        let pricing = PricingResolver::new(catalog.clone());
        let orders = OrderService::new(db.clone(), event_sender.clone(), pricing);
        let checkout = CheckoutService::new(
            orders.clone(),
            catalog.clone(),
            gateway.clone(),
            event_sender.clone(),
            CheckoutConfig {
                currency: config.currency.clone(),
                success_url: config.checkout_success_url.clone(),
                cancel_url: config.checkout_cancel_url.clone(),
            },
        );
        let payments = PaymentConfirmationService::new(
            db,
            orders.clone(),
            catalog.clone(),
            gateway,
            event_sender,
        );
        Self {
            catalog,
            customers,
            orders,
            checkout,
            payments,
        }
    }
}

/// Versioned API surface, nested under `/api/v1` by the caller.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", products::routes())
        .nest("/plans", plans::routes())
        .nest("/orders", orders::routes())
        .nest("/checkout", checkout::routes())
        .nest("/webhooks/payments", payment_webhooks::routes())
}
