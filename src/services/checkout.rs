use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::order_item::{self, ItemKind},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{
        CheckoutLineItem, CheckoutMode, CheckoutSession, CreateSessionRequest, PaymentGateway,
        METADATA_ORDER_ID,
    },
};

use super::{catalog::CatalogService, orders::OrderService};

/// Static checkout parameters taken from the application configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Redirect target handed back to the client.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

/// Builds payment-gateway checkout sessions for persisted orders.
///
/// Read-only with respect to the order; the state transition happens in the
/// confirmation service once the gateway reports completion.
#[derive(Clone)]
pub struct CheckoutService {
    orders: OrderService,
    catalog: CatalogService,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: EventSender,
    config: CheckoutConfig,
}

impl CheckoutService {
    pub fn new(
        orders: OrderService,
        catalog: CatalogService,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: EventSender,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            orders,
            catalog,
            gateway,
            event_sender,
            config,
        }
    }

    #[instrument(skip(self), fields(order_id = %order_id, requesting_user = %requesting_user))]
    pub async fn initiate(
        &self,
        order_id: Uuid,
        requesting_user: Uuid,
    ) -> Result<CheckoutRedirect, ServiceError> {
        let order = self.orders.get_order(order_id).await?;
        if order.order.customer_id != requesting_user {
            return Err(ServiceError::Forbidden(
                "you are not authorized to pay for this order".to_string(),
            ));
        }

        let mut line_items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            line_items.push(self.gateway_line_item(item).await?);
        }

        let mode = if order.order.order_type.includes_subscription() {
            CheckoutMode::Subscription
        } else {
            CheckoutMode::Payment
        };

        let session: CheckoutSession = self
            .gateway
            .create_checkout_session(CreateSessionRequest {
                line_items,
                mode,
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
                metadata: HashMap::from([(
                    METADATA_ORDER_ID.to_string(),
                    order_id.to_string(),
                )]),
            })
            .await?;

        let url = session.url.clone().ok_or_else(|| {
            ServiceError::GatewayError("created session carries no redirect URL".to_string())
        })?;

        info!(session_id = %session.id, ?mode, "Checkout session created");
        self.event_sender
            .send(Event::CheckoutSessionCreated {
                order_id,
                session_id: session.id.clone(),
            })
            .await;

        Ok(CheckoutRedirect {
            session_id: session.id,
            url,
        })
    }

    /// Maps one stored order line to its gateway representation.
    ///
    /// Product lines become inline priced items carrying the snapshotted
    /// unit price; subscription lines resolve to the recurring price
    /// registered on the gateway under the plan's lookup key.
    async fn gateway_line_item(
        &self,
        item: &order_item::Model,
    ) -> Result<CheckoutLineItem, ServiceError> {
        match item.item_kind {
            ItemKind::Product => {
                let product = self.catalog.find_product(item.item_id).await?;
                Ok(CheckoutLineItem::Priced {
                    name: product.name,
                    description: product.description,
                    image_url: product.image_url,
                    currency: self.config.currency.clone(),
                    unit_amount_minor: to_minor_units(item.unit_price)?,
                    quantity: i64::from(item.quantity),
                })
            }
            ItemKind::Subscription => {
                let plan = self.catalog.find_plan(item.item_id).await?;
                let lookup_key = plan.gateway_price_lookup_key.ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "no recurring price registered for plan {}",
                        plan.id
                    ))
                })?;
                let prices = self.gateway.list_recurring_prices(&lookup_key).await?;
                let price = prices.into_iter().next().ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "no recurring price found for lookup key {lookup_key}"
                    ))
                })?;
                Ok(CheckoutLineItem::RecurringPrice {
                    price_id: price.id,
                    quantity: 1,
                })
            }
        }
    }
}

/// Converts a decimal amount to minor currency units (cents).
fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| {
            ServiceError::InternalError(format!("amount {amount} out of minor-unit range"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(to_minor_units(dec!(12.50)).unwrap(), 1250);
        assert_eq!(to_minor_units(dec!(0.01)).unwrap(), 1);
        assert_eq!(to_minor_units(dec!(30)).unwrap(), 3000);
        // Sub-cent amounts round to the nearest cent.
        assert_eq!(to_minor_units(dec!(9.999)).unwrap(), 1000);
    }
}
