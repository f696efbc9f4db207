//! Building fields from received neighbour data
//!
//! The round layer collects `(neighbour id, value)` pairs from incoming
//! messages and turns them into a [`Field`] or a [`Placed`] value through a
//! [`Neighborhood`]. This is the only public way to obtain a field with
//! explicit neighbour entries.

use std::collections::BTreeMap;

use tracing::debug;

use crate::device::DeviceId;
use crate::error::FieldError;
use crate::field::{Field, Payload};
use crate::placed::Placed;
use crate::tier::{Placement, Tier};

/// Neighbour values gathered during a round
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood<T> {
    self_value: T,
    entries: BTreeMap<DeviceId, T>,
}

impl<T: Payload> Neighborhood<T> {
    /// Start from the value of the running device
    pub fn new(self_value: T) -> Self {
        Self {
            self_value,
            entries: BTreeMap::new(),
        }
    }

    /// Build from parallel vectors: `values[0]` is the self value and
    /// `values[i + 1]` belongs to `ids[i]`
    pub fn from_parts(ids: Vec<DeviceId>, values: Vec<T>) -> Result<Self, FieldError> {
        if values.is_empty() {
            return Err(FieldError::MissingDefault);
        }
        if values.len() != ids.len() + 1 {
            return Err(FieldError::LengthMismatch {
                ids: ids.len(),
                values: values.len(),
            });
        }
        let mut values = values.into_iter();
        let mut hood = match values.next() {
            Some(self_value) => Self::new(self_value),
            None => return Err(FieldError::MissingDefault),
        };
        hood.extend(ids.into_iter().zip(values));
        Ok(hood)
    }

    /// Record the value received from `id`, replacing any earlier one
    pub fn receive(&mut self, id: DeviceId, value: T) -> &mut Self {
        if self.entries.insert(id, value).is_some() {
            debug!(device = %id, "neighbour value replaced within one round");
        }
        self
    }

    pub fn self_value(&self) -> &T {
        &self.self_value
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of neighbours heard from
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of the neighbours heard from, in increasing order
    pub fn domain(&self) -> Vec<DeviceId> {
        self.entries.keys().copied().collect()
    }

    pub fn into_field(self) -> Field<T> {
        let (ids, values) = self.entries.into_iter().unzip();
        Field::from_parts_unchecked(ids, values, self.self_value)
    }

    /// Build a placed value for a device of tier `TIER`
    ///
    /// The neighbour entries are dropped when `S` sees no neighbours, and
    /// everything is dropped when `S` excludes `TIER`.
    pub fn into_placed<const TIER: Tier, S: Placement>(self) -> Placed<TIER, T, S> {
        Placed::from_field(self.into_field())
    }
}

impl<T: Payload> Extend<(DeviceId, T)> for Neighborhood<T> {
    fn extend<I: IntoIterator<Item = (DeviceId, T)>>(&mut self, iter: I) {
        for (id, value) in iter {
            self.receive(id, value);
        }
    }
}

/// Build a field from parallel vectors (see [`Neighborhood::from_parts`])
pub fn make_field<T: Payload>(ids: Vec<DeviceId>, values: Vec<T>) -> Result<Field<T>, FieldError> {
    Neighborhood::from_parts(ids, values).map(Neighborhood::into_field)
}

/// Build a placed value from parallel vectors (see
/// [`Neighborhood::from_parts`])
pub fn make_placed<const TIER: Tier, T: Payload, S: Placement>(
    ids: Vec<DeviceId>,
    values: Vec<T>,
) -> Result<Placed<TIER, T, S>, FieldError> {
    Neighborhood::from_parts(ids, values).map(Neighborhood::into_placed)
}
