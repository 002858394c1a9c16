use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::order_item::ItemKind;

/// Placed order. Created `Pending`/unpaid, mutated only by payment
/// confirmation and the administrative status update; never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Sum over the line totals, snapshotted at creation; never recomputed
    /// from live catalog prices
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub paid: bool,
    /// Gateway transaction identifier, set on confirmation
    #[sea_orm(nullable)]
    pub payment_id: Option<String>,
    pub shipping_street: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub shipping_country: String,
    pub shipping_phone: String,
    /// Set once payment of a subscription-bearing order is confirmed
    #[sea_orm(nullable)]
    pub end_of_subscription: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle status. `Delivered`, `Cancelled` and `Refunded` are
/// terminal; no transition graph is enforced beyond enum membership.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "OUT_FOR_DELIVERY")]
    OutForDelivery,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
}

/// Classification of an order by the kinds of items it contains.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[sea_orm(string_value = "PRODUCT_ONLY")]
    ProductOnly,
    #[sea_orm(string_value = "SUBSCRIPTION_ONLY")]
    SubscriptionOnly,
    #[sea_orm(string_value = "MIXED")]
    Mixed,
}

impl OrderType {
    /// Pure derivation from the item kinds an order contains.
    pub fn from_item_kinds<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = ItemKind>,
    {
        let mut has_product = false;
        let mut has_subscription = false;
        for kind in kinds {
            match kind {
                ItemKind::Product => has_product = true,
                ItemKind::Subscription => has_subscription = true,
            }
        }
        match (has_product, has_subscription) {
            (true, false) => OrderType::ProductOnly,
            (false, true) => OrderType::SubscriptionOnly,
            _ => OrderType::Mixed,
        }
    }

    pub fn includes_subscription(self) -> bool {
        matches!(self, OrderType::SubscriptionOnly | OrderType::Mixed)
    }
}
