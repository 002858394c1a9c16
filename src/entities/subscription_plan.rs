use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Admin-managed recurring meal-plan offering.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Selling points stored as a JSON array of strings
    #[sea_orm(column_type = "Json")]
    pub description: Json,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub price: Decimal,
    pub duration: PlanDuration,
    /// Discount in percent, 0 when none applies
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub discount_percent: Decimal,
    /// `price - price * discount_percent / 100`, derived on every price or
    /// discount change
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub discounted_price: Decimal,
    /// Lookup key of the matching recurring price registered on the payment
    /// gateway; plans without one cannot enter checkout
    #[sea_orm(nullable)]
    pub gateway_price_lookup_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Billing period granularity of a plan.
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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanDuration {
    #[sea_orm(string_value = "DAILY")]
    Daily,
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
}

/// Derives the discounted price from a base price and a percentage discount.
pub fn discounted_price(price: Decimal, discount_percent: Decimal) -> Decimal {
    price - price * discount_percent / Decimal::from(100)
}
