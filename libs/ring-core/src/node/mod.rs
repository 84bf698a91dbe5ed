//! Node identity and finger table entries.

pub mod store;

use std::net::SocketAddr;

use crate::ring::{KeySpace, NodeId};

/// A peer of the ring: its identifier plus the address the transport
/// dials to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub addr: SocketAddr,
}

impl Node {
    /// A node whose identifier is derived from its address.
    pub fn new(addr: SocketAddr, space: KeySpace) -> Self {
        let id = space.hash_key(addr.to_string().as_bytes());
        Self::with_id(id, addr)
    }

    pub fn with_id(id: impl Into<NodeId>, addr: SocketAddr) -> Self {
        Self {
            id: id.into(),
            addr,
        }
    }
}

/// A routing shortcut: the best known successor of `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finger {
    pub start: NodeId,
    pub node: Node,
}

impl Finger {
    /// A fresh table of `space.bits()` entries, all pointing at the owner.
    pub(crate) fn init_finger_table(node: Node, space: KeySpace) -> Vec<Finger> {
        (0..space.bits())
            .map(|index| Finger {
                start: space.finger_start(node.id, index),
                node: node.clone(),
            })
            .collect()
    }
}
