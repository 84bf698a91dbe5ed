//! In-process loopback transport.
//!
//! Nodes register themselves in a process-wide table keyed by listen
//! address; a [`SimClient`] dispatches calls straight into the target's
//! handlers, including the loopback case where the target is the caller
//! itself. Removing a node from the table makes every call to it fail
//! with `ConnectionFailed`, which is how tests simulate crashes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lazy_static::lazy_static;

use crate::client::{Client, ClientError};
use crate::node::store::Value;
use crate::node::Node;
use crate::ring::NodeId;
use crate::service::NodeService;

lazy_static! {
    static ref NETWORK: Mutex<HashMap<SocketAddr, Arc<NodeService<SimClient>>>> =
        Mutex::new(HashMap::new());
}

/// The process-wide registry of simulated nodes.
pub struct SimNet;

impl SimNet {
    pub fn register(service: Arc<NodeService<SimClient>>) {
        NETWORK.lock().unwrap().insert(service.addr(), service);
    }

    /// Take a node off the network; clients of it start failing.
    pub fn kill(addr: SocketAddr) -> bool {
        NETWORK.lock().unwrap().remove(&addr).is_some()
    }

    fn lookup(addr: SocketAddr) -> Option<Arc<NodeService<SimClient>>> {
        NETWORK.lock().unwrap().get(&addr).cloned()
    }
}

/// Transport client speaking to one simulated peer.
#[derive(Debug, Clone)]
pub struct SimClient {
    addr: SocketAddr,
}

impl SimClient {
    fn target(&self) -> Result<Arc<NodeService<SimClient>>, ClientError> {
        SimNet::lookup(self.addr)
            .ok_or_else(|| ClientError::ConnectionFailed(format!("no node on {}", self.addr)))
    }
}

#[async_trait]
impl Client for SimClient {
    async fn init(addr: SocketAddr) -> Self {
        Self { addr }
    }

    async fn find_successor(&self, id: NodeId) -> Result<Node, ClientError> {
        Ok(self.target()?.find_successor(id).await)
    }

    async fn successor(&self) -> Result<Node, ClientError> {
        Ok(self.target()?.successor())
    }

    async fn successor_list(&self) -> Result<Vec<Node>, ClientError> {
        Ok(self.target()?.successor_list())
    }

    async fn predecessor(&self) -> Result<Option<Node>, ClientError> {
        Ok(self.target()?.predecessor())
    }

    async fn notify(&self, node: Node) -> Result<(), ClientError> {
        self.target()?.notify(node);
        Ok(())
    }

    async fn ping(&self) -> Result<(), ClientError> {
        let _ = self.target()?;
        Ok(())
    }

    async fn storage_value(&self, key: String) -> Result<Value, ClientError> {
        self.target()?
            .storage_value(&key)
            .map_err(|_| ClientError::NotFound)
    }

    async fn store_value(&self, key: String, value: Value) -> Result<(), ClientError> {
        self.target()?.store_value(key, value);
        Ok(())
    }
}
