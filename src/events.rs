//! Order lifecycle events.
//!
//! Published to NATS after the checkout transaction commits. The
//! notification consumer (order-confirmation email, etc.) hangs off the
//! `orders.placed` subject, so a delivery failure can never abort an
//! already-committed order.

use serde::Serialize;
use uuid::Uuid;

pub const SUBJECT_ORDER_PLACED: &str = "orders.placed";

#[derive(Clone, Debug, Serialize)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub order_number: String,
    pub tracking_id: String,
    pub email: String,
    pub full_name: String,
    pub grand_total: i64,
}

pub async fn publish_order_placed(
    client: &async_nats::Client,
    event: &OrderPlaced,
) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(event)?;
    client
        .publish(SUBJECT_ORDER_PLACED.to_string(), payload.into())
        .await?;
    Ok(())
}

/// Best-effort publish from a detached task; failures are logged and
/// otherwise ignored.
pub fn notify_order_placed(client: Option<async_nats::Client>, event: OrderPlaced) {
    let Some(client) = client else {
        tracing::debug!(order_number = %event.order_number, "no event bus configured, skipping order notification");
        return;
    };
    tokio::spawn(async move {
        if let Err(e) = publish_order_placed(&client, &event).await {
            tracing::warn!(error = %e, order_number = %event.order_number, "failed to publish order event");
        }
    });
}
