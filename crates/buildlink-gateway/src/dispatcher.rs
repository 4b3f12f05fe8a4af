use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};
use tracing::debug;

use buildlink_types::events::GatewayEvent;

type UserChannel = (u64, mpsc::UnboundedSender<GatewayEvent>);

/// Routes events to connected users. One live connection per account; a
/// newer connection replaces the older one.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// email -> (conn_id, sender)
    user_channels: RwLock<HashMap<String, UserChannel>>,
    next_conn_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a targeted channel for `email`. Returns (conn_id, receiver).
    pub async fn register_user_channel(
        &self,
        email: &str,
    ) -> (u64, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = self
            .inner
            .next_conn_id
            .fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .user_channels
            .write()
            .await
            .insert(email.to_string(), (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister `email`'s channel, but only if `conn_id` still owns it.
    pub async fn unregister_user_channel(&self, email: &str, conn_id: u64) {
        let mut channels = self.inner.user_channels.write().await;
        if channels.get(email).is_some_and(|(id, _)| *id == conn_id) {
            channels.remove(email);
        }
    }

    /// Push an event to `email` if they are connected. Returns whether it was
    /// handed to a live connection.
    pub async fn send_to_user(&self, email: &str, event: GatewayEvent) -> bool {
        let channels = self.inner.user_channels.read().await;
        match channels.get(email) {
            Some((_, tx)) => tx.send(event).is_ok(),
            None => {
                debug!("{} is offline, dropping event", email);
                false
            }
        }
    }

    pub async fn is_online(&self, email: &str) -> bool {
        self.inner.user_channels.read().await.contains_key(email)
    }
}
