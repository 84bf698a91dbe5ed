use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;

use crate::client::MockClient;
use crate::config::NodeConfig;
use crate::{Node, NodeId, NodeService};

mod notify;
mod stabilize;
mod storage;

lazy_static! {
    pub(crate) static ref MTX: Mutex<()> = Mutex::new(());
}

// `MockClient::init_context` installs a process-wide expectation, so
// tests touching the mock must not run in parallel.
pub(crate) fn get_lock(m: &'static Mutex<()>) -> MutexGuard<'static, ()> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn addr(id: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 42000 + id))
}

pub(crate) fn node(id: u16) -> Node {
    Node::with_id(NodeId(id as u64), addr(id))
}

pub(crate) fn config() -> NodeConfig {
    NodeConfig {
        bits: 8,
        ..NodeConfig::default()
    }
}

pub(crate) fn service(id: u16) -> NodeService<MockClient> {
    NodeService::with_id(NodeId(id as u64), addr(id), config())
}
