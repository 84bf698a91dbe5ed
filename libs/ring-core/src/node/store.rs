use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::node::{Finger, Node};
use crate::ring::{Interval, KeySpace, NodeId};

/// Opaque bytes stored under a key.
pub type Value = Vec<u8>;

/// Mutable overlay state of one node.
#[derive(Debug)]
pub struct NodeStore {
    db: Db,
}

#[derive(Debug, Clone)]
pub(crate) struct Db {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    local: Node,
    space: KeySpace,
    successor_cap: usize,
    predecessor: Option<Node>,
    finger_table: Vec<Finger>,
    /// Successors ordered by forward ring distance from the local node,
    /// head first. The head is the successor; failover promotes the next
    /// entry when it dies.
    successor_list: Vec<Node>,
    /// Values whose key hashes into `(predecessor, local]`.
    storage: HashMap<String, Value>,
}

impl NodeStore {
    pub(crate) fn new(local: Node, space: KeySpace, successor_cap: usize) -> Self {
        Self {
            db: Db::new(local, space, successor_cap),
        }
    }

    /// Get the shared state handle. Internally an `Arc`, so a clone only
    /// increments the ref count.
    pub(crate) fn db(&self) -> Db {
        self.db.clone()
    }
}

impl Db {
    pub(crate) fn new(local: Node, space: KeySpace, successor_cap: usize) -> Db {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                finger_table: Finger::init_finger_table(local.clone(), space),
                successor_list: vec![local.clone()],
                local,
                space,
                successor_cap,
                predecessor: None,
                storage: HashMap::new(),
            }),
        });

        Db { shared }
    }

    pub(crate) fn set_predecessor(&self, predecessor: Node) {
        let mut state = self.shared_state();
        state.predecessor = Some(predecessor);
    }

    pub(crate) fn unset_predecessor(&self) {
        let mut state = self.shared_state();
        state.predecessor = None;
    }

    pub(crate) fn predecessor(&self) -> Option<Node> {
        let state = self.shared_state();
        state.predecessor.clone()
    }

    /// Make `successor` the new head of the successor list. The previous
    /// head stays behind it as failover material.
    pub(crate) fn set_successor(&self, successor: Node) {
        let mut state = self.shared_state();
        log::debug!("setting successor to {:?}", successor);
        let local_id = state.local.id;
        if successor.id == local_id {
            return;
        }
        state
            .successor_list
            .retain(|n| n.id != successor.id && n.id != local_id);
        state.successor_list.insert(0, successor);
        let cap = state.successor_cap;
        state.successor_list.truncate(cap);
    }

    /// The head of the successor list, or the local node once the list is
    /// exhausted.
    pub(crate) fn successor(&self) -> Node {
        let state = self.shared_state();
        state
            .successor_list
            .first()
            .cloned()
            .unwrap_or_else(|| state.local.clone())
    }

    /// Drop a dead successor; the next list entry takes over.
    pub(crate) fn remove_successor(&self, id: NodeId) {
        let mut state = self.shared_state();
        state.successor_list.retain(|n| n.id != id);
    }

    /// Rebuild the successor list from fresh candidates: order them by
    /// forward distance from the local node, drop the local node and
    /// duplicates, cap at the configured length.
    ///
    /// The previous list is discarded rather than merged in. Stale
    /// entries would otherwise survive every rebuild and keep promoting a
    /// dead node back to the head; deriving the list from the successor's
    /// view alone washes dead peers out after one round per node.
    pub(crate) fn merge_successor_list(&self, candidates: Vec<Node>) {
        let mut state = self.shared_state();
        let local_id = state.local.id;
        let space = state.space;
        let cap = state.successor_cap;

        let mut merged: Vec<Node> = candidates
            .into_iter()
            .filter(|n| n.id != local_id)
            .collect();
        merged.sort_by_key(|n| space.distance(local_id, n.id));
        merged.dedup_by_key(|n| n.id);
        merged.truncate(cap);

        state.successor_list = merged;
    }

    pub(crate) fn successor_list(&self) -> Vec<Node> {
        let state = self.shared_state();
        state.successor_list.clone()
    }

    /// Closest finger strictly preceding `key`, scanning from the farthest
    /// shortcut down.
    pub(crate) fn closest_preceding_finger(&self, key: NodeId) -> Option<Node> {
        let state = self.shared_state();
        let range = Interval::open(state.local.id, key);
        state
            .finger_table
            .iter()
            .rev()
            .find(|finger| range.contains(finger.node.id))
            .map(|finger| finger.node.clone())
    }

    pub(crate) fn update_finger(&self, index: usize, node: Node) {
        let mut state = self.shared_state();
        state.finger_table[index].node = node;
    }

    pub(crate) fn finger_table(&self) -> Vec<Finger> {
        let state = self.shared_state();
        state.finger_table.clone()
    }

    pub(crate) fn storage_value(&self, key: &str) -> Option<Value> {
        let state = self.shared_state();
        state.storage.get(key).cloned()
    }

    pub(crate) fn storage_insert(&self, key: String, value: Value) {
        let mut state = self.shared_state();
        state.storage.insert(key, value);
    }

    fn shared_state(&self) -> std::sync::MutexGuard<'_, State> {
        match self.shared.state.lock() {
            Ok(state) => state,
            Err(err) => {
                log::error!("node state lock poisoned: {}", err);
                panic!("node state lock poisoned");
            }
        }
    }
}
