//! Payment-gateway boundary.
//!
//! The ordering core talks to the gateway through [`PaymentGateway`]; the
//! production implementation is the Stripe client in [`stripe`], tests plug
//! in a scripted one.

pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ServiceError;

pub use stripe::StripeGateway;

/// Session metadata key correlating a checkout session back to its order.
pub const METADATA_ORDER_ID: &str = "order_id";

/// How the gateway should settle the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time payment
    Payment,
    /// Recurring subscription
    Subscription,
}

/// One entry of a gateway checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutLineItem {
    /// Inline-priced item (product lines)
    Priced {
        name: String,
        description: String,
        image_url: Option<String>,
        currency: String,
        /// Unit amount in minor currency units (cents)
        unit_amount_minor: i64,
        quantity: i64,
    },
    /// Reference to a recurring price registered on the gateway (plan lines)
    RecurringPrice { price_id: String, quantity: i64 },
}

#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub line_items: Vec<CheckoutLineItem>,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

/// Gateway-hosted checkout session, as created or retrieved.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    pub id: String,
    /// Redirect target for the customer; present on freshly created sessions
    pub url: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Gateway transaction identifier (payment intent or subscription id),
    /// present once the session has been completed
    pub transaction_id: Option<String>,
}

impl CheckoutSession {
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_ORDER_ID).map(String::as_str)
    }
}

/// Recurring price pre-registered on the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct RecurringPrice {
    pub id: String,
    pub lookup_key: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout session and returns it verbatim.
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, ServiceError>;

    /// Retrieves a session by id; `None` when the gateway does not know it.
    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSession>, ServiceError>;

    /// Lists active recurring prices registered under a lookup key.
    async fn list_recurring_prices(
        &self,
        lookup_key: &str,
    ) -> Result<Vec<RecurringPrice>, ServiceError>;
}
