//! Per-node configuration.

use std::time::Duration;

use thiserror::Error;

use crate::ring::{KeySpace, NodeId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("key-bit width must be within 1..=64, got {0}")]
    BitsOutOfRange(u32),
    #[error("successor list capacity must be at least 1")]
    SuccessorCapTooSmall,
}

/// Periods of the three maintenance loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenancePeriods {
    pub stabilize: Duration,
    pub fix_fingers: Duration,
    pub check_predecessor: Duration,
}

impl Default for MaintenancePeriods {
    fn default() -> Self {
        Self {
            stabilize: Duration::from_millis(500),
            fix_fingers: Duration::from_millis(500),
            check_predecessor: Duration::from_millis(1000),
        }
    }
}

/// Configuration of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Key-bit width `M` of the identifier space.
    pub bits: u32,
    /// Fixed identifier; a random `bits`-wide one is drawn when absent.
    pub id: Option<NodeId>,
    /// Successor list capacity; defaults to `ceil(log2(bits))`, min 1.
    pub successor_list_cap: Option<usize>,
    pub periods: MaintenancePeriods,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bits: KeySpace::MAX_BITS,
            id: None,
            successor_list_cap: None,
            periods: MaintenancePeriods::default(),
        }
    }
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bits < 1 || self.bits > KeySpace::MAX_BITS {
            return Err(ConfigError::BitsOutOfRange(self.bits));
        }
        if self.successor_list_cap == Some(0) {
            return Err(ConfigError::SuccessorCapTooSmall);
        }
        Ok(())
    }

    pub fn space(&self) -> KeySpace {
        KeySpace::new(self.bits)
    }

    /// Effective successor list capacity `L`.
    pub fn successor_cap(&self) -> usize {
        self.successor_list_cap
            .unwrap_or_else(|| (32 - (self.bits.max(2) - 1).leading_zeros()) as usize)
    }
}
