//! Identifier arithmetic on the modular ring.
//!
//! Every identifier lives in `[0, 2^M)` where `M` is the key-bit width of
//! the ring. [`KeySpace`] owns `M` and performs the modular arithmetic;
//! [`Interval`] answers cyclic containment questions, including the
//! wrap-around and degenerate cases.

use std::fmt;

use rand::Rng;

/// An identifier on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl NodeId {
    /// First five characters of the decimal form, used by status lines.
    pub fn short(&self) -> String {
        let mut repr = self.0.to_string();
        repr.truncate(5);
        repr
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identifier space of a ring, `[0, 2^bits)`.
///
/// Every member of a ring must agree on `bits`; mixing widths is not
/// detected and breaks routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpace {
    bits: u32,
}

impl KeySpace {
    pub const MAX_BITS: u32 = 64;

    /// Panics when `bits` is outside `1..=64`; `NodeConfig::validate`
    /// rejects such widths before a `KeySpace` is ever built.
    pub fn new(bits: u32) -> Self {
        assert!(
            (1..=Self::MAX_BITS).contains(&bits),
            "key-bit width must be within 1..=64, got {}",
            bits
        );
        Self { bits }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    fn mask(&self) -> u64 {
        if self.bits == Self::MAX_BITS {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Map an arbitrary 64-bit value into the space.
    pub fn reduce(&self, raw: u64) -> NodeId {
        NodeId(raw & self.mask())
    }

    /// Identifier of a byte string, e.g. a storage key or a listen address.
    pub fn hash_key(&self, data: &[u8]) -> NodeId {
        self.reduce(seahash::hash(data))
    }

    pub fn random_id(&self) -> NodeId {
        self.reduce(rand::thread_rng().gen())
    }

    /// Start of finger `index`: `(id + 2^index) mod 2^bits`.
    pub fn finger_start(&self, id: NodeId, index: u32) -> NodeId {
        assert!(index < self.bits, "finger index {} out of range", index);
        self.reduce(id.0.wrapping_add(1u64 << index))
    }

    /// Forward distance from `from` to `to`: `(to - from) mod 2^bits`.
    pub fn distance(&self, from: NodeId, to: NodeId) -> u64 {
        to.0.wrapping_sub(from.0) & self.mask()
    }
}

/// A cyclic interval between two identifiers.
///
/// When `start == end` the open form covers the whole ring minus the
/// endpoint and any inclusive form covers the whole ring.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    start: NodeId,
    end: NodeId,
    include_start: bool,
    include_end: bool,
}

impl Interval {
    pub fn new(start: NodeId, end: NodeId, include_start: bool, include_end: bool) -> Self {
        Self {
            start,
            end,
            include_start,
            include_end,
        }
    }

    /// `(start, end)`
    pub fn open(start: NodeId, end: NodeId) -> Self {
        Self::new(start, end, false, false)
    }

    /// `(start, end]`
    pub fn open_closed(start: NodeId, end: NodeId) -> Self {
        Self::new(start, end, false, true)
    }

    /// `[start, end)`
    pub fn closed_open(start: NodeId, end: NodeId) -> Self {
        Self::new(start, end, true, false)
    }

    /// `[start, end]`
    pub fn closed(start: NodeId, end: NodeId) -> Self {
        Self::new(start, end, true, true)
    }

    pub fn contains(&self, x: NodeId) -> bool {
        if self.start == self.end {
            if x == self.start {
                return self.include_start || self.include_end;
            }
            return true;
        }

        let after_start = x > self.start || (self.include_start && x == self.start);
        let before_end = x < self.end || (self.include_end && x == self.end);

        if self.start < self.end {
            after_start && before_end
        } else {
            // The interval wraps through `2^bits - 1 -> 0`.
            after_start || before_end
        }
    }
}
