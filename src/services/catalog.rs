use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as ProductEntity},
        subscription_plan::{self, discounted_price, Entity as PlanEntity, PlanDuration},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

fn validate_price(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("range");
        err.message = Some("price must be greater than 0".into());
        Err(err)
    }
}

fn validate_discount(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::from(100) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("range");
        err.message = Some("discount must be between 0 and 100 percent".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "ingredients are required"))]
    pub ingredients: Vec<String>,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    pub available: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Merged into the existing list, duplicates dropped
    pub ingredients: Option<Vec<String>>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    pub available: Option<bool>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlanInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    pub duration: PlanDuration,
    #[serde(default)]
    #[validate(custom = "validate_discount")]
    pub discount_percent: Decimal,
    pub gateway_price_lookup_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePlanInput {
    pub name: Option<String>,
    /// Merged into the existing list, duplicates dropped
    pub description: Option<Vec<String>>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    pub duration: Option<PlanDuration>,
    #[validate(custom = "validate_discount")]
    pub discount_percent: Option<Decimal>,
    pub gateway_price_lookup_key: Option<String>,
}

/// Catalog of products and subscription plans: admin CRUD plus the lookups
/// the pricing resolver depends on.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    // ---- lookups used by pricing and checkout ----

    pub async fn find_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    pub async fn find_plan(&self, id: Uuid) -> Result<subscription_plan::Model, ServiceError> {
        PlanEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Subscription plan {id} not found")))
    }

    // ---- products ----

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            ingredients: Set(serde_json::json!(input.ingredients)),
            price: Set(input.price),
            available: Set(input.available),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %model.id, "Product created");
        self.event_sender.send(Event::ProductCreated(model.id)).await;
        Ok(model)
    }

    pub async fn list_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(ProductEntity::find()
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let existing = self.find_product(id).await?;

        let merged_ingredients = input.ingredients.map(|new_entries| {
            let mut all = existing.ingredient_list();
            for entry in new_entries {
                if !all.contains(&entry) {
                    all.push(entry);
                }
            }
            all
        });

        let mut model = existing.into_active_model();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(ingredients) = merged_ingredients {
            model.ingredients = Set(serde_json::json!(ingredients));
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(available) = input.available {
            model.available = Set(available);
        }
        if let Some(image_url) = input.image_url {
            model.image_url = Set(Some(image_url));
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;
        info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        // 404 before delete so a missing id is reported as such
        let existing = self.find_product(id).await?;
        ProductEntity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!(product_id = %id, "Product deleted");
        self.event_sender.send(Event::ProductDeleted(id)).await;
        Ok(())
    }

    // ---- subscription plans ----

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_plan(
        &self,
        input: CreatePlanInput,
    ) -> Result<subscription_plan::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();

        let model = subscription_plan::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(serde_json::json!(input.description)),
            price: Set(input.price),
            duration: Set(input.duration),
            discount_percent: Set(input.discount_percent),
            discounted_price: Set(discounted_price(input.price, input.discount_percent)),
            gateway_price_lookup_key: Set(input.gateway_price_lookup_key),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(plan_id = %model.id, "Subscription plan created");
        self.event_sender.send(Event::PlanCreated(model.id)).await;
        Ok(model)
    }

    pub async fn list_plans(&self) -> Result<Vec<subscription_plan::Model>, ServiceError> {
        Ok(PlanEntity::find()
            .order_by_asc(subscription_plan::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_plan(
        &self,
        id: Uuid,
        input: UpdatePlanInput,
    ) -> Result<subscription_plan::Model, ServiceError> {
        input.validate()?;
        let existing = self.find_plan(id).await?;

        // The derived price tracks whichever of price/discount changed.
        let effective_price = input.price.unwrap_or(existing.price);
        let effective_discount = input.discount_percent.unwrap_or(existing.discount_percent);
        let recompute = input.price.is_some() || input.discount_percent.is_some();

        let merged_description = input.description.map(|new_entries| {
            let mut all: Vec<String> = existing
                .description
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            for entry in new_entries {
                if !all.contains(&entry) {
                    all.push(entry);
                }
            }
            all
        });

        let mut model = existing.into_active_model();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = merged_description {
            model.description = Set(serde_json::json!(description));
        }
        if let Some(price) = input.price {
            model.price = Set(price);
        }
        if let Some(duration) = input.duration {
            model.duration = Set(duration);
        }
        if let Some(discount) = input.discount_percent {
            model.discount_percent = Set(discount);
        }
        if recompute {
            model.discounted_price = Set(discounted_price(effective_price, effective_discount));
        }
        if let Some(key) = input.gateway_price_lookup_key {
            model.gateway_price_lookup_key = Set(Some(key));
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;
        info!(plan_id = %id, "Subscription plan updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_plan(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.find_plan(id).await?;
        PlanEntity::delete_by_id(existing.id).exec(&*self.db).await?;
        info!(plan_id = %id, "Subscription plan deleted");
        self.event_sender.send(Event::PlanDeleted(id)).await;
        Ok(())
    }
}
