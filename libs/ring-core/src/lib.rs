//! Core library for meshring: the per-node overlay state machine of a
//! Chord-style distributed hash table.
//!
//! A [`NodeService`] owns one node's ring state and implements identifier
//! routing, the join/stabilize/notify protocols, failure handling and
//! local storage on top of an abstract transport ([`Client`]). Concrete
//! transports live in sibling crates; the [`sim`] module provides an
//! in-process one for tests.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod node;
pub mod ring;
pub mod service;
pub mod sim;

pub use client::{Client, ClientError, ClientsPool};
pub use config::{ConfigError, MaintenancePeriods, NodeConfig};
pub use lifecycle::{join_ring, Lifecycle};
pub use node::store::Value;
pub use node::{Finger, Node};
pub use ring::{Interval, KeySpace, NodeId};
pub use service::{NodeService, ServiceError};
