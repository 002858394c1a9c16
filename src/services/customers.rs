use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::customer::{self, Entity as CustomerEntity},
    errors::ServiceError,
};

/// Read-only view of the account directory.
///
/// Accounts are managed by the auth service; the ordering core only looks up
/// the profile of the requesting principal and never writes it.
#[derive(Clone)]
pub struct CustomerDirectory {
    db: Arc<DbPool>,
}

impl CustomerDirectory {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        CustomerEntity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {customer_id} not found")))
    }
}
