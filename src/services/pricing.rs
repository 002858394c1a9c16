use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entities::order_item::ItemKind, errors::ServiceError};

use super::catalog::CatalogService;

/// One requested cart entry, before catalog resolution.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineItemRequest {
    pub item_id: Uuid,
    pub kind: ItemKind,
    /// Ignored for subscription lines, which are always quantity 1
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// A line item with its price snapshotted from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLineItem {
    pub kind: ItemKind,
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Resolution result: priced lines plus their summed total.
#[derive(Debug, Clone)]
pub struct PricedItems {
    pub items: Vec<PricedLineItem>,
    pub total: Decimal,
}

/// Resolves requested items against the catalog, snapshotting prices.
///
/// Side-effect-free. Lookups run concurrently; the first missing catalog
/// entry fails the whole resolution so no partially priced set escapes.
#[derive(Clone)]
pub struct PricingResolver {
    catalog: CatalogService,
}

impl PricingResolver {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }

    pub async fn resolve(
        &self,
        requested: &[LineItemRequest],
    ) -> Result<PricedItems, ServiceError> {
        if requested.is_empty() {
            return Err(ServiceError::ValidationError(
                "order must contain at least one item".to_string(),
            ));
        }
        for item in requested {
            if item.kind == ItemKind::Product && item.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for product {} must be at least 1",
                    item.item_id
                )));
            }
        }

        let items = try_join_all(requested.iter().map(|item| self.resolve_one(item))).await?;
        let total = items.iter().map(|line| line.line_total).sum();
        Ok(PricedItems { items, total })
    }

    async fn resolve_one(&self, item: &LineItemRequest) -> Result<PricedLineItem, ServiceError> {
        match item.kind {
            ItemKind::Product => {
                let product = self.catalog.find_product(item.item_id).await?;
                let quantity = item.quantity;
                Ok(PricedLineItem {
                    kind: ItemKind::Product,
                    item_id: product.id,
                    name: product.name,
                    quantity,
                    unit_price: product.price,
                    line_total: product.price * Decimal::from(quantity),
                })
            }
            ItemKind::Subscription => {
                let plan = self.catalog.find_plan(item.item_id).await?;
                // Subscriptions bill per period; the requested quantity is ignored.
                Ok(PricedLineItem {
                    kind: ItemKind::Subscription,
                    item_id: plan.id,
                    name: plan.name,
                    quantity: 1,
                    unit_price: plan.price,
                    line_total: plan.price,
                })
            }
        }
    }
}
