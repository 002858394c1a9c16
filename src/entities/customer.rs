use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer account as seen by the ordering core.
///
/// Account management (registration, verification, password handling) is owned
/// by the auth service; this side only reads the profile and address snapshot
/// needed to place and ship orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(nullable)]
    pub first_name: Option<String>,
    #[sea_orm(nullable)]
    pub last_name: Option<String>,
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    #[sea_orm(nullable)]
    pub street: Option<String>,
    #[sea_orm(nullable)]
    pub city: Option<String>,
    #[sea_orm(nullable)]
    pub postal_code: Option<String>,
    #[sea_orm(nullable)]
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the profile carries everything an order shipment needs:
    /// full name, phone number, and a complete address.
    pub fn has_complete_shipping_profile(&self) -> bool {
        fn present(field: &Option<String>) -> bool {
            field.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        present(&self.first_name)
            && present(&self.last_name)
            && present(&self.phone)
            && present(&self.street)
            && present(&self.city)
            && present(&self.postal_code)
            && present(&self.country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_customer() -> Model {
        Model {
            id: Uuid::new_v4(),
            email: "jo@example.com".into(),
            first_name: Some("Jo".into()),
            last_name: Some("Meier".into()),
            phone: Some("+4915112345678".into()),
            street: Some("Hauptstr. 5".into()),
            city: Some("Berlin".into()),
            postal_code: Some("10115".into()),
            country: Some("DE".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn complete_profile_passes() {
        assert!(complete_customer().has_complete_shipping_profile());
    }

    #[test]
    fn missing_or_blank_fields_fail() {
        let mut customer = complete_customer();
        customer.postal_code = None;
        assert!(!customer.has_complete_shipping_profile());

        let mut customer = complete_customer();
        customer.phone = Some("   ".into());
        assert!(!customer.has_complete_shipping_profile());

        let mut customer = complete_customer();
        customer.first_name = None;
        assert!(!customer.has_complete_shipping_profile());
    }
}
