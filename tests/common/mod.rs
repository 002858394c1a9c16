use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use mealkit_api::{
    auth::{Claims, ROLE_ADMIN},
    config::AppConfig,
    db,
    entities::{customer, subscription_plan::PlanDuration},
    errors::ServiceError,
    events,
    gateway::{
        CheckoutSession, CreateSessionRequest, PaymentGateway, RecurringPrice, METADATA_ORDER_ID,
    },
    handlers::AppServices,
    services::catalog::{CreatePlanInput, CreateProductInput},
    AppState,
};

pub const JWT_SECRET: &str = "test_secret_key_for_testing_purposes_32";

/// Scripted in-memory gateway. Created sessions are recorded; completing one
/// makes subsequent retrievals report a transaction id.
#[derive(Default)]
pub struct FakeGateway {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    prices: Mutex<HashMap<String, RecurringPrice>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a recurring price under a lookup key.
    pub async fn register_price(&self, lookup_key: &str, price_id: &str) {
        self.prices.lock().await.insert(
            lookup_key.to_string(),
            RecurringPrice {
                id: price_id.to_string(),
                lookup_key: Some(lookup_key.to_string()),
            },
        );
    }

    /// Marks a session as completed with the given transaction id.
    pub async fn complete_session(&self, session_id: &str, transaction_id: &str) {
        if let Some(session) = self.sessions.lock().await.get_mut(session_id) {
            session.transaction_id = Some(transaction_id.to_string());
        }
    }

    /// Inserts a session directly, without going through checkout.
    pub async fn inject_session(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let id = format!("cs_test_{}", Uuid::new_v4().simple());
        let session = CheckoutSession {
            id: id.clone(),
            url: Some(format!("https://gateway.test/pay/{id}")),
            metadata: request.metadata,
            transaction_id: None,
        };
        self.sessions
            .lock()
            .await
            .insert(id.clone(), session.clone());
        Ok(session)
    }

    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSession>, ServiceError> {
        Ok(self.sessions.lock().await.get(session_id).cloned())
    }

    async fn list_recurring_prices(
        &self,
        lookup_key: &str,
    ) -> Result<Vec<RecurringPrice>, ServiceError> {
        Ok(self
            .prices
            .lock()
            .await
            .get(lookup_key)
            .cloned()
            .into_iter()
            .collect())
    }
}

/// Application harness backed by an in-memory SQLite database and the
/// scripted gateway.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    _event_task: tokio::task::JoinHandle<()>,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: JWT_SECRET.into(),
        host: "127.0.0.1".into(),
        port: 18080,
        environment: "test".into(),
        log_level: "warn".into(),
        log_json: false,
        currency: "eur".into(),
        stripe_secret_key: "sk_test_unused".into(),
        stripe_api_base: "http://127.0.0.1:0".into(),
        checkout_success_url: "https://shop.test/success".into(),
        checkout_cancel_url: "https://shop.test/cancel".into(),
        payment_webhook_secret: None,
        payment_webhook_tolerance_secs: 300,
        auto_migrate: true,
        db_max_connections: 1,
        db_min_connections: 1,
        cors_allowed_origins: None,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = test_config();
        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_sender, event_rx) = events::channel();
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = FakeGateway::new();
        let services = AppServices::new(
            db.clone(),
            event_sender.clone(),
            gateway.clone(),
            &cfg,
        );

        let state = AppState {
            db,
            config: cfg,
            event_sender,
            services,
        };

        let router = mealkit_api::app_router().with_state(state.clone());

        Self {
            router,
            state,
            gateway,
            _event_task: event_task,
        }
    }

    /// Issues a bearer token for the given customer id.
    pub fn token_for(&self, customer_id: Uuid, admin: bool) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: customer_id.to_string(),
            email: Some("test@example.com".into()),
            roles: if admin {
                vec![ROLE_ADMIN.into()]
            } else {
                vec!["USER".into()]
            },
            iat: now,
            exp: now + 3600,
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("encode test token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {tok}"));
        }
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Inserts a customer; shippable unless `incomplete` is set.
    pub async fn seed_customer(&self, incomplete: bool) -> customer::Model {
        let now = Utc::now();
        let model = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(format!("{}@example.com", Uuid::new_v4().simple())),
            first_name: Set(Some("Ada".into())),
            last_name: Set(Some("Lovelace".into())),
            phone: Set(if incomplete {
                None
            } else {
                Some("+4915112345678".into())
            }),
            street: Set(if incomplete {
                None
            } else {
                Some("1 Analytical Way".into())
            }),
            city: Set(Some("Berlin".into())),
            postal_code: Set(Some("10115".into())),
            country: Set(Some("DE".into())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model
            .insert(&*self.state.db)
            .await
            .expect("seed customer for tests")
    }

    pub async fn seed_product(&self, name: &str, price: Decimal) -> Uuid {
        let product = self
            .state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: "Seeded for integration tests".to_string(),
                ingredients: vec!["salt".to_string(), "pepper".to_string()],
                price,
                available: true,
                image_url: None,
            })
            .await
            .expect("seed product for tests");
        product.id
    }

    pub async fn seed_plan(
        &self,
        name: &str,
        price: Decimal,
        duration: PlanDuration,
        lookup_key: Option<&str>,
    ) -> Uuid {
        if let Some(key) = lookup_key {
            self.gateway
                .register_price(key, &format!("price_{}", Uuid::new_v4().simple()))
                .await;
        }
        let plan = self
            .state
            .services
            .catalog
            .create_plan(CreatePlanInput {
                name: name.to_string(),
                description: vec!["Weekly boxes".to_string()],
                price,
                duration,
                discount_percent: Decimal::ZERO,
                gateway_price_lookup_key: lookup_key.map(str::to_string),
            })
            .await
            .expect("seed plan for tests");
        plan.id
    }

    /// Injects a completed session tied to an order, as the gateway would
    /// report it after the customer paid.
    pub async fn inject_completed_session(
        &self,
        session_id: &str,
        order_id: Uuid,
        transaction_id: &str,
    ) {
        let mut metadata = HashMap::new();
        metadata.insert(METADATA_ORDER_ID.to_string(), order_id.to_string());
        self.gateway
            .inject_session(CheckoutSession {
                id: session_id.to_string(),
                url: None,
                metadata,
                transaction_id: Some(transaction_id.to_string()),
            })
            .await;
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Parses a string-encoded decimal out of a response body. Sqlite does not
/// preserve trailing scale, so amounts must be compared as numbers rather
/// than as verbatim JSON strings.
pub fn decimal_field(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse::<Decimal>().ok())
        .unwrap_or_else(|| panic!("expected a decimal string, got {value}"))
}
