use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::client::{Client, ClientError, ClientsPool};
use crate::config::NodeConfig;
use crate::node::store::{Db, NodeStore, Value};
use crate::node::{Finger, Node};
use crate::ring::{Interval, KeySpace, NodeId};

#[cfg(test)]
pub(crate) mod tests;

pub use self::error::ServiceError;

/// The overlay state machine of one ring node.
///
/// Owns the node's ring state and drives every protocol operation through
/// an abstract transport `C`. The public methods double as the handlers
/// for inbound RPCs; the maintenance operations are meant to be driven
/// periodically (see [`crate::lifecycle::Lifecycle`]).
#[derive(Debug)]
pub struct NodeService<C: Client> {
    id: NodeId,
    addr: SocketAddr,
    space: KeySpace,
    store: NodeStore,

    clients: ClientsPool<C>,
    next_finger: AtomicUsize,
    maintenance_started: AtomicBool,
}

impl<C: Client> NodeService<C> {
    /// Create a node listening on `addr`.
    ///
    /// The identifier comes from the config, or is drawn at random from
    /// the configured key space.
    pub fn new(addr: SocketAddr, config: NodeConfig) -> Self {
        let id = config.id.unwrap_or_else(|| config.space().random_id());
        Self::with_id(id, addr, config)
    }

    pub fn with_id(id: impl Into<NodeId>, addr: SocketAddr, config: NodeConfig) -> Self {
        let id = id.into();
        let space = config.space();
        let store = NodeStore::new(Node::with_id(id, addr), space, config.successor_cap());
        Self {
            id,
            addr,
            space,
            store,
            clients: ClientsPool::default(),
            next_finger: AtomicUsize::new(0),
            maintenance_started: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn space(&self) -> KeySpace {
        self.space
    }

    /// This node as a peer reference.
    pub fn node(&self) -> Node {
        Node::with_id(self.id, self.addr)
    }

    pub(crate) fn store(&self) -> Db {
        self.store.db()
    }

    /// The current successor: the head of the successor list, or this
    /// node itself once the list is exhausted.
    pub fn successor(&self) -> Node {
        self.store().successor()
    }

    pub fn predecessor(&self) -> Option<Node> {
        self.store().predecessor()
    }

    /// The successor list, capped at the configured length.
    pub fn successor_list(&self) -> Vec<Node> {
        self.store().successor_list()
    }

    pub fn finger_table(&self) -> Vec<Finger> {
        self.store().finger_table()
    }

    /// A node is isolated when it is its own successor and nobody claims
    /// to precede it: a fresh singleton, or one cut off from its ring.
    pub fn is_isolated(&self) -> bool {
        self.predecessor().is_none() && self.successor().id == self.id
    }

    /// One-line state summary: liveness, predecessor, own id, successor,
    /// successor list.
    pub fn status(&self) -> String {
        let liveness = if self.is_isolated() { "dead" } else { "alive" };
        let predecessor = self
            .predecessor()
            .map(|p| p.id.short())
            .unwrap_or_else(|| "none".to_string());
        let successors = self
            .successor_list()
            .iter()
            .map(|n| n.id.short())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{} pre:{} node:{} succ:{} succList:{}",
            liveness,
            predecessor,
            self.id.short(),
            self.successor().id.short(),
            successors
        )
    }

    /// Find the node responsible for `key`.
    ///
    /// Answers directly when `key` falls between this node and its
    /// successor, otherwise forwards to the closest preceding finger. A
    /// dead hop is not fatal: the lookup falls back to this node and the
    /// caller may retry once stabilization has caught up.
    pub async fn find_successor(&self, key: NodeId) -> Node {
        let successor = self.successor();
        if Interval::open_closed(self.id, successor.id).contains(key) {
            return successor;
        }

        let next_hop = self.closest_preceding_finger(key);
        if next_hop.id == self.id {
            return self.node();
        }

        let client = self.client(next_hop.clone()).await;
        match client.find_successor(key).await {
            Ok(found) => found,
            Err(err) => {
                log::warn!("lookup of {} via {} failed: {}", key, next_hop.id, err);
                self.clients.evict(next_hop.id).await;
                self.node()
            }
        }
    }

    /// Closest finger preceding `key`, falling back to this node.
    fn closest_preceding_finger(&self, key: NodeId) -> Node {
        self.store()
            .closest_preceding_finger(key)
            .unwrap_or_else(|| self.node())
    }

    /// Join a ring through `peer`: ask it for the successor of our own id
    /// and adopt the answer. The predecessor stays unknown until somebody
    /// notifies us.
    pub async fn join(&self, peer: Node) -> Result<(), ServiceError> {
        let client = self.client(peer).await;
        let successor = client.find_successor(self.id).await?;
        log::info!("joined ring, successor is {}", successor.id);
        self.store().set_successor(successor);
        Ok(())
    }

    /// Handle a peer announcing itself as a predecessor candidate.
    ///
    /// An isolated node also adopts the candidate as its successor; that
    /// is what pulls the bootstrap node of a fresh ring out of its
    /// one-member state once the first joiner shows up.
    pub fn notify(&self, candidate: Node) {
        if candidate.id == self.id {
            return;
        }
        if self.is_isolated() {
            log::debug!("woken up by {}", candidate.id);
            self.store().set_successor(candidate.clone());
        }

        let accept = match self.predecessor() {
            None => true,
            Some(current) => Interval::open(current.id, self.id).contains(candidate.id),
        };
        if accept {
            log::debug!("setting predecessor to {:?}", candidate);
            self.store().set_predecessor(candidate);
        }
    }

    /// Reconcile our successor with the successor's own view and push our
    /// claim as its predecessor. A singleton has nothing to reconcile.
    ///
    /// A transport failure anywhere along the sequence demotes the
    /// successor we were talking to: it is dropped from the successor
    /// list and the next entry takes over.
    pub async fn stabilize(&self) -> Result<(), ServiceError> {
        let successor = self.successor();
        if successor.id == self.id {
            return Ok(());
        }

        match self.run_stabilize(successor).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unreachable() => {
                self.demote_successor().await;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn run_stabilize(&self, successor: Node) -> Result<(), ClientError> {
        let client = self.client(successor.clone()).await;
        let claimed = client.predecessor().await?;
        drop(client);

        if let Some(candidate) = claimed {
            if Interval::open(self.id, successor.id).contains(candidate.id) {
                self.store().set_successor(candidate);
            }
        }

        let successor = self.successor();
        let client = self.client(successor.clone()).await;
        client.notify(self.node()).await?;

        let mut candidates = client.successor_list().await?;
        candidates.push(successor);
        self.store().merge_successor_list(candidates);

        Ok(())
    }

    /// Drop the current successor and promote the next known one.
    async fn demote_successor(&self) {
        let dead = self.successor();
        self.store().remove_successor(dead.id);
        self.clients.evict(dead.id).await;
        log::warn!(
            "successor {} is unreachable, promoting {}",
            dead.id,
            self.successor().id
        );
    }

    /// Probe the predecessor and forget it once it stops answering.
    pub async fn check_predecessor(&self) -> Result<(), ServiceError> {
        if let Some(predecessor) = self.predecessor() {
            let client = self.client(predecessor.clone()).await;
            match client.ping().await {
                Ok(()) => Ok(()),
                Err(err) if err.is_unreachable() => {
                    log::info!("predecessor {} stopped answering", predecessor.id);
                    self.store().unset_predecessor();
                    self.clients.evict(predecessor.id).await;
                    Ok(())
                }
                Err(err) => Err(err.into()),
            }
        } else {
            Ok(())
        }
    }

    /// Refresh one finger per call, round-robin over the table.
    pub async fn fix_fingers(&self) {
        let index = (self.next_finger.fetch_add(1, Ordering::Relaxed) % self.space.bits() as usize)
            as u32;
        let start = self.space.finger_start(self.id, index);
        let node = self.find_successor(start).await;
        self.store().update_finger(index as usize, node);
    }

    /// A value stored on this node; `KeyNotFound` when absent.
    pub fn storage_value(&self, key: &str) -> Result<Value, ServiceError> {
        self.store()
            .storage_value(key)
            .ok_or_else(|| ServiceError::KeyNotFound(key.to_string()))
    }

    /// Store a value on this node.
    pub fn store_value(&self, key: String, value: Value) {
        self.store().storage_insert(key, value);
    }

    /// Fetch `key` from whichever node is responsible for it.
    pub async fn lookup(&self, key: &str) -> Result<Value, ServiceError> {
        let owner = self.find_successor(self.space.hash_key(key.as_bytes())).await;
        if owner.id == self.id {
            return self.storage_value(key);
        }
        let client = self.client(owner).await;
        match client.storage_value(key.to_string()).await {
            Ok(value) => Ok(value),
            Err(ClientError::NotFound) => Err(ServiceError::KeyNotFound(key.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// Store `key` on whichever node is responsible for it.
    pub async fn put(&self, key: String, value: Value) -> Result<(), ServiceError> {
        let owner = self.find_successor(self.space.hash_key(key.as_bytes())).await;
        if owner.id == self.id {
            self.store_value(key, value);
            return Ok(());
        }
        let client = self.client(owner).await;
        client.store_value(key, value).await?;
        Ok(())
    }

    pub(crate) fn mark_maintenance_started(&self) -> bool {
        !self.maintenance_started.swap(true, Ordering::SeqCst)
    }

    async fn client(&self, node: Node) -> Arc<C> {
        self.clients.get_or_init(node).await
    }
}

pub mod error {
    use thiserror::Error;

    use crate::client::ClientError;

    #[derive(Debug, Error)]
    pub enum ServiceError {
        #[error("client error: {0}")]
        Client(#[from] ClientError),
        #[error("no value stored under key {0:?}")]
        KeyNotFound(String),
    }
}
