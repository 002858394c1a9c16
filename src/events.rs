use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    CheckoutSessionCreated {
        order_id: Uuid,
        session_id: String,
    },
    PaymentConfirmed {
        order_id: Uuid,
        payment_id: String,
    },
    ProductCreated(Uuid),
    ProductDeleted(Uuid),
    PlanCreated(Uuid),
    PlanDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; delivery is best-effort and never fails the caller.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "Event channel closed, dropping event");
        }
    }
}

/// Creates a channel pair sized for request-scoped event bursts.
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(1024);
    (EventSender::new(tx), rx)
}

/// Background task draining the event channel. Events are observability
/// signals here; nothing downstream consumes them transactionally.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(order_id) => info!(%order_id, "event: order created"),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(%order_id, %old_status, %new_status, "event: order status changed"),
            Event::CheckoutSessionCreated {
                order_id,
                session_id,
            } => info!(%order_id, %session_id, "event: checkout session created"),
            Event::PaymentConfirmed {
                order_id,
                payment_id,
            } => info!(%order_id, %payment_id, "event: payment confirmed"),
            Event::ProductCreated(id) => info!(product_id = %id, "event: product created"),
            Event::ProductDeleted(id) => info!(product_id = %id, "event: product deleted"),
            Event::PlanCreated(id) => info!(plan_id = %id, "event: plan created"),
            Event::PlanDeleted(id) => info!(plan_id = %id, "event: plan deleted"),
        }
    }
}
