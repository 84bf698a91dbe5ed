//! TCP transport for meshring nodes.
//!
//! The wire protocol is a tarpc service over bincode-framed TCP. The
//! [`client`] module adapts the generated tarpc client to the core
//! [`meshring_core::Client`] trait; [`server`] hosts a `NodeService`
//! behind the same surface.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use meshring_core::{Node, NodeId, Value};

pub mod client;
pub mod server;

pub use client::RingClient;
pub use server::Server;

/// A node reference on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireNode {
    pub id: u64,
    pub addr: SocketAddr,
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        Self {
            id: node.id.0,
            addr: node.addr,
        }
    }
}

impl From<WireNode> for Node {
    fn from(node: WireNode) -> Self {
        Node::with_id(NodeId(node.id), node.addr)
    }
}

/// Application-level failure of a request that did reach the peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Fault {
    NotFound,
    Internal(String),
}

/// The RPC surface of a ring node.
#[tarpc::service]
pub trait RingRpc {
    /// Successor of `id`, from the callee's point of view.
    async fn find_successor(id: u64) -> WireNode;
    async fn successor() -> WireNode;
    async fn successor_list() -> Vec<WireNode>;
    async fn predecessor() -> Option<WireNode>;
    async fn notify(node: WireNode);
    async fn ping();
    async fn storage_value(key: String) -> Result<Value, Fault>;
    async fn store_value(key: String, value: Value);
}
