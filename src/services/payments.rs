use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        order::{self, Entity as OrderEntity, OrderStatus},
        order_item::ItemKind,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::PaymentGateway,
};

use super::{catalog::CatalogService, orders::OrderService, subscription_period};

/// Applies a completed gateway checkout session to its order: flips `paid`,
/// records the transaction id, approves the order, and stamps the
/// subscription period where one was bought.
///
/// Safe to invoke more than once per session: the paid flip is a
/// compare-and-swap from `false` to `true`, and a repeat confirmation with
/// the same transaction id is a no-op success.
#[derive(Clone)]
pub struct PaymentConfirmationService {
    db: Arc<DbPool>,
    orders: OrderService,
    catalog: CatalogService,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: EventSender,
}

impl PaymentConfirmationService {
    pub fn new(
        db: Arc<DbPool>,
        orders: OrderService,
        catalog: CatalogService,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            orders,
            catalog,
            gateway,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn confirm(&self, session_id: &str) -> Result<order::Model, ServiceError> {
        let session = self
            .gateway
            .retrieve_session(session_id)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "checkout session {session_id} not found at payment gateway"
                ))
            })?;

        let order_id = session
            .order_id()
            .ok_or_else(|| {
                ServiceError::PaymentError(
                    "payment session carries no order correlation".to_string(),
                )
            })
            .and_then(|raw| {
                Uuid::parse_str(raw).map_err(|_| {
                    ServiceError::PaymentError(format!(
                        "payment session carries malformed order id {raw}"
                    ))
                })
            })?;

        let payment_id = session.transaction_id.clone().ok_or_else(|| {
            ServiceError::PaymentError(format!(
                "session {session_id} has no transaction identifier; payment not completed"
            ))
        })?;

        let loaded = self.orders.get_order(order_id).await?;

        if loaded.order.paid {
            return self.already_paid(loaded.order, &payment_id);
        }

        let end_of_subscription = self.subscription_end(&loaded).await?;

        // Compare-and-swap on `paid`: only the first confirmation for an
        // unpaid order writes; a concurrent duplicate matches zero rows.
        let result = OrderEntity::update_many()
            .col_expr(order::Column::Paid, Expr::value(true))
            .col_expr(order::Column::PaymentId, Expr::value(payment_id.clone()))
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Approved))
            .col_expr(
                order::Column::EndOfSubscription,
                Expr::value(end_of_subscription),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(
                order::Column::Version,
                Expr::col(order::Column::Version).add(1),
            )
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Paid.eq(false))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            // Lost the race against another confirmation of the same order.
            let current = self.orders.get_order(order_id).await?;
            return self.already_paid(current.order, &payment_id);
        }

        info!(%order_id, %payment_id, "Payment confirmed, order approved");
        self.event_sender
            .send(Event::PaymentConfirmed {
                order_id,
                payment_id,
            })
            .await;

        let confirmed = self.orders.get_order(order_id).await?;
        Ok(confirmed.order)
    }

    /// Resolution for an order that is already paid: the same transaction is
    /// a harmless replay, a different one is a conflict.
    fn already_paid(
        &self,
        order: order::Model,
        payment_id: &str,
    ) -> Result<order::Model, ServiceError> {
        if order.payment_id.as_deref() == Some(payment_id) {
            info!(order_id = %order.id, %payment_id, "Repeat confirmation for paid order, nothing to do");
            Ok(order)
        } else {
            warn!(
                order_id = %order.id,
                existing = ?order.payment_id,
                incoming = %payment_id,
                "Confirmation with a different transaction id for a paid order"
            );
            Err(ServiceError::Conflict(format!(
                "order {} is already paid under a different transaction",
                order.id
            )))
        }
    }

    /// For subscription-bearing orders, computes the end of the purchased
    /// period from the plan's duration, starting now.
    async fn subscription_end(
        &self,
        loaded: &super::orders::OrderWithItems,
    ) -> Result<Option<DateTime<Utc>>, ServiceError> {
        if !loaded.order.order_type.includes_subscription() {
            return Ok(None);
        }

        let line = loaded
            .items
            .iter()
            .find(|item| item.item_kind == ItemKind::Subscription)
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "order {} is typed as subscription-bearing but has no subscription line",
                    loaded.order.id
                ))
            })?;

        let plan = self.catalog.find_plan(line.item_id).await?;
        let end = subscription_period::compute_end(Utc::now(), plan.duration)?;
        Ok(Some(end))
    }
}
