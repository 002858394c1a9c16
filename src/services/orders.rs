use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        customer,
        order::{self, Entity as OrderEntity, OrderStatus, OrderType},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::pricing::{LineItemRequest, PricingResolver};

/// An order together with its line items.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// One page of orders for the admin listing.
#[derive(Debug)]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Order lifecycle: creation, retrieval, and the administrative status
/// update. Payment-side mutations live in the confirmation service.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    pricing: PricingResolver,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, pricing: PricingResolver) -> Self {
        Self {
            db,
            event_sender,
            pricing,
        }
    }

    /// Creates an order in `Pending`/unpaid state.
    ///
    /// The customer profile must be shippable before any catalog access;
    /// price resolution is all-or-nothing, so a single unknown item leaves
    /// no record behind.
    #[instrument(skip(self, customer, requested), fields(customer_id = %customer.id, item_count = requested.len()))]
    pub async fn create_order(
        &self,
        customer: &customer::Model,
        requested: &[LineItemRequest],
    ) -> Result<OrderWithItems, ServiceError> {
        if !customer.has_complete_shipping_profile() {
            return Err(ServiceError::PreconditionFailed(
                "please update your details and address".to_string(),
            ));
        }

        let priced = self.pricing.resolve(requested).await?;
        let order_type = OrderType::from_item_kinds(priced.items.iter().map(|line| line.kind));

        let now = Utc::now();
        let order_id = Uuid::new_v4();

        // Shipping snapshot; presence was verified by the profile check.
        let order_model = order::ActiveModel {
            id: Set(order_id),
            customer_id: Set(customer.id),
            total_amount: Set(priced.total),
            order_type: Set(order_type),
            status: Set(OrderStatus::Pending),
            paid: Set(false),
            payment_id: Set(None),
            shipping_street: Set(customer.street.clone().unwrap_or_default()),
            shipping_city: Set(customer.city.clone().unwrap_or_default()),
            shipping_postal_code: Set(customer.postal_code.clone().unwrap_or_default()),
            shipping_country: Set(customer.country.clone().unwrap_or_default()),
            shipping_phone: Set(customer.phone.clone().unwrap_or_default()),
            end_of_subscription: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            version: Set(1),
        };

        let txn = self.db.begin().await?;
        let order = order_model.insert(&txn).await?;

        let mut items = Vec::with_capacity(priced.items.len());
        for line in &priced.items {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                item_kind: Set(line.kind),
                item_id: Set(line.item_id),
                name: Set(line.name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total),
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }
        txn.commit().await?;

        info!(order_id = %order_id, order_type = %order_type, total = %priced.total, "Order created");
        self.event_sender.send(Event::OrderCreated(order_id)).await;

        Ok(OrderWithItems { order, items })
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderWithItems, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Orders of one customer, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderWithItems>, ServiceError> {
        let orders = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.eq(order.id))
                .all(&*self.db)
                .await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    /// All orders, paginated, for the admin view.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, page: u64, per_page: u64) -> Result<OrderPage, ServiceError> {
        let paginator = OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderPage {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Administrative status update. Any member of the status enum may follow
    /// any other; only enum membership is validated, at the string boundary.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                warn!(%order_id, "Order not found for status update");
                ServiceError::NotFound(format!("Order {order_id} not found"))
            })?;

        let old_status = order.status;
        let version = order.version;

        let mut model = order.into_active_model();
        model.status = Set(new_status);
        model.updated_at = Set(Utc::now());
        model.version = Set(version + 1);
        let updated = model.update(&*self.db).await?;

        info!(%order_id, %old_status, %new_status, "Order status updated");
        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        Ok(updated)
    }
}
