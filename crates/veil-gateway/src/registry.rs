use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use veil_types::events::ServerEvent;

/// The broadcast membership table: which connections are currently joined
/// to which group. This is the only shared mutable in-memory state in the
/// server; everything else lives in the store.
///
/// Membership is per connection, not per user: a user with two open
/// connections appears twice, and sender exclusion on broadcast skips only
/// the sending connection.
#[derive(Clone)]
pub struct GroupRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// group id -> (connection id -> that connection's outbound channel)
    groups: RwLock<HashMap<String, HashMap<Uuid, mpsc::UnboundedSender<ServerEvent>>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                groups: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Add a connection to a group's broadcast set. Idempotent: re-joining
    /// replaces the stored sender for that connection.
    pub async fn join(
        &self,
        group_id: &str,
        conn_id: Uuid,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let mut groups = self.inner.groups.write().await;
        groups
            .entry(group_id.to_string())
            .or_default()
            .insert(conn_id, tx);
    }

    /// Remove a connection from every broadcast set. Called on disconnect;
    /// empty groups are dropped so the table does not grow unbounded.
    pub async fn leave_all(&self, conn_id: Uuid) {
        let mut groups = self.inner.groups.write().await;
        for members in groups.values_mut() {
            members.remove(&conn_id);
        }
        groups.retain(|_, members| !members.is_empty());
    }

    /// Deliver an event to every member of the group except the sending
    /// connection. Best effort: a failed send just means that peer is
    /// already tearing down. Returns how many members were reached.
    pub async fn broadcast(&self, group_id: &str, sender: Uuid, event: ServerEvent) -> usize {
        let groups = self.inner.groups.read().await;
        let Some(members) = groups.get(group_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (&conn_id, tx) in members.iter() {
            if conn_id == sender {
                continue;
            }
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Current size of a group's broadcast set.
    pub async fn member_count(&self, group_id: &str) -> usize {
        let groups = self.inner.groups.read().await;
        groups.get(group_id).map_or(0, |members| members.len())
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
