use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Domain events emitted by the services. Delivery is best-effort; a full
/// channel or closed receiver is logged and otherwise ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartCreated(Uuid),
    CartItemAdded {
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemUpdated {
        cart_id: Uuid,
        item_id: Uuid,
    },
    CartItemRemoved {
        cart_id: Uuid,
        item_id: Uuid,
    },
    CartCleared(Uuid),
    QuoteRequested {
        quote_id: Uuid,
        total_items: usize,
    },
    QuoteStatusChanged {
        quote_id: Uuid,
        status: String,
    },
}

/// Cloneable handle for publishing events onto the shared channel.
#[derive(Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging instead of propagating any failure.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}

/// Consumes events off the channel. Today this only logs them; it is the
/// seam where mail notifications for new quote requests would attach.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::QuoteRequested {
                quote_id,
                total_items,
            } => {
                info!(
                    "Quote request {} received with {} items",
                    quote_id, total_items
                );
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let cart_id = Uuid::new_v4();

        sender.send_or_log(Event::CartCreated(cart_id)).await;

        match rx.recv().await {
            Some(Event::CartCreated(id)) => assert_eq!(id, cart_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out.
        sender.send_or_log(Event::CartCleared(Uuid::new_v4())).await;
    }
}
