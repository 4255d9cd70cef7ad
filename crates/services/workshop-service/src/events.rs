//! Live fan-out of service record changes.
//!
//! Every successful write hands a fully associated snapshot to an
//! [`EventPublisher`]. The production publisher is a [`BroadcastHub`]; the
//! WebSocket layer subscribes to it once per connection.

use serde::Serialize;
use tokio::sync::broadcast;

use domain::{ServiceRecordView, SERVICE_UPDATE_EVENT};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Buffered events per subscriber before it starts lagging.
const HUB_CAPACITY: usize = 256;

/// A change notification as sent to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEvent {
    pub event: &'static str,
    pub data: ServiceRecordView,
}

impl ServiceEvent {
    pub fn service_update(record: ServiceRecordView) -> Self {
        Self {
            event: SERVICE_UPDATE_EVENT,
            data: record,
        }
    }
}

/// Fire-and-forget publication. Implementations must not block and must
/// not fail the caller.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ServiceEvent);
}

/// In-process hub backed by a tokio broadcast channel.
#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<ServiceEvent>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_capacity(HUB_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for BroadcastHub {
    fn publish(&self, event: ServiceEvent) {
        let record_id = event.data.id;
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(%record_id, receivers, "Published service update");
            }
            Err(_) => {
                tracing::debug!(%record_id, "No live subscribers for service update");
            }
        }
    }
}

/// Publisher that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: ServiceEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::ServiceStatus;
    use uuid::Uuid;

    fn view() -> ServiceRecordView {
        let now = Utc::now();
        ServiceRecordView {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            status: ServiceStatus::Pending,
            scheduled_date: now,
            description: None,
            estimated_cost: 0.0,
            customer_name: "Jane".to_string(),
            customer_contact: "555-0100".to_string(),
            parts_used: Vec::new(),
            total_bill: 0.0,
            created_at: now,
            updated_at: now,
            vehicle: None,
            owner: None,
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_event() {
        let hub = BroadcastHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        let event = ServiceEvent::service_update(view());
        hub.publish(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        let hub = BroadcastHub::new();
        hub.publish(ServiceEvent::service_update(view()));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_dropped_subscriber_is_released() {
        let hub = BroadcastHub::new();
        let rx = hub.subscribe();
        drop(rx);
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(ServiceEvent::service_update(view()));
    }

    #[test]
    fn test_event_wire_shape() {
        let event = ServiceEvent::service_update(view());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "serviceUpdate");
        assert_eq!(json["data"]["status"], "pending");
        assert!(json["data"]["customerName"].is_string());
    }
}
