//! Device identity
//!
//! Neighbouring fields are keyed by [`DeviceId`]. Ids are totally ordered so
//! that a field can keep its neighbours sorted and look them up by binary
//! search.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Identifier of a device in the aggregate network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Create a device id from its raw number
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying number
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// All ids from `start` up to `end` (inclusive)
    pub fn range(start: u64, end: u64) -> Vec<Self> {
        (start..=end).map(Self).collect()
    }

    /// Short display form for logging
    pub fn short_id(&self) -> String {
        format!("d{}", self.0)
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
