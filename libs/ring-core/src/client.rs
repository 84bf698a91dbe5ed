//! Abstract transport surface and the per-peer client pool.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::node::store::Value;
use crate::node::Node;
use crate::ring::NodeId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("request timed out")]
    Timeout,
    #[error("key not found")]
    NotFound,
    #[error("client is not connected")]
    NotInitialized,
    #[error("unexpected client failure: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Whether the peer should be treated as dead.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed(_) | ClientError::Timeout | ClientError::NotInitialized
        )
    }
}

/// The RPC surface a transport has to provide.
///
/// One client instance speaks to one peer. `init` may not fail: transports
/// connect lazily and report unreachable peers from the individual calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Client: Send + Sync {
    async fn init(addr: SocketAddr) -> Self;

    /// Ask the peer to find the successor of `id`.
    async fn find_successor(&self, id: NodeId) -> Result<Node, ClientError>;

    /// The peer's current successor.
    async fn successor(&self) -> Result<Node, ClientError>;

    /// The peer's successor list, capped at the peer's configured length.
    async fn successor_list(&self) -> Result<Vec<Node>, ClientError>;

    /// The peer's current predecessor.
    async fn predecessor(&self) -> Result<Option<Node>, ClientError>;

    /// Tell the peer we might be its predecessor.
    async fn notify(&self, node: Node) -> Result<(), ClientError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), ClientError>;

    /// Fetch a value stored on the peer; `NotFound` when absent.
    async fn storage_value(&self, key: String) -> Result<Value, ClientError>;

    /// Store a value on the peer.
    async fn store_value(&self, key: String, value: Value) -> Result<(), ClientError>;
}

/// One client per peer, created on first use.
///
/// Demotion paths evict their peer so a node that comes back later gets a
/// fresh connection instead of a stale handle.
#[derive(Debug)]
pub struct ClientsPool<C> {
    clients: Mutex<HashMap<NodeId, Arc<C>>>,
}

impl<C: Client> ClientsPool<C> {
    pub async fn get_or_init(&self, node: Node) -> Arc<C> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&node.id) {
            return client.clone();
        }
        let client = Arc::new(C::init(node.addr).await);
        clients.insert(node.id, client.clone());
        client
    }

    pub async fn evict(&self, id: NodeId) {
        self.clients.lock().await.remove(&id);
    }
}

impl<C> Default for ClientsPool<C> {
    fn default() -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
        }
    }
}
