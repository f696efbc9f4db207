//! Neighbouring fields
//!
//! A [`Field<T>`] maps neighbour device ids to values, with a default value
//! covering every device not listed explicitly. The default doubles as the
//! value the field takes on the running device itself.
//!
//! Neighbour ids are kept strictly increasing so that lookups are binary
//! searches and pointwise combination is a linear merge.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::error::FieldError;

/// Marker for types that may be carried inside a [`Field`] or a
/// [`Placed`](crate::placed::Placed)
///
/// Neither `Field` nor `Placed` implement it, so fields of fields and placed
/// values of placed values are rejected by the compiler.
pub trait Payload: Clone + 'static {}

macro_rules! impl_payload {
    ($($t:ty),* $(,)?) => {
        $(impl Payload for $t {})*
    };
}

impl_payload!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, DeviceId,
);

impl<T: Payload> Payload for Vec<T> {}
impl<T: Payload> Payload for Option<T> {}
impl<T: Payload> Payload for Box<T> {}
impl<T: Payload, const N: usize> Payload for [T; N] {}
impl<A: Payload> Payload for (A,) {}
impl<A: Payload, B: Payload> Payload for (A, B) {}
impl<A: Payload, B: Payload, C: Payload> Payload for (A, B, C) {}
impl<A: Payload, B: Payload, C: Payload, D: Payload> Payload for (A, B, C, D) {}

/// Values held by neighbouring devices, with a default for everyone else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawField<T>")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Field<T> {
    ids: Vec<DeviceId>,
    values: Vec<T>,
    default: T,
}

#[derive(Deserialize)]
struct RawField<T> {
    ids: Vec<DeviceId>,
    values: Vec<T>,
    default: T,
}

impl<T> TryFrom<RawField<T>> for Field<T> {
    type Error = FieldError;

    fn try_from(raw: RawField<T>) -> Result<Self, Self::Error> {
        Self::from_sorted(raw.ids, raw.values, raw.default)
    }
}

impl<T> Field<T> {
    /// A field taking the same value on every device
    pub fn constant(value: T) -> Self
    where
        T: Payload,
    {
        Self {
            ids: Vec::new(),
            values: Vec::new(),
            default: value,
        }
    }

    /// Validate and build from parallel id/value vectors
    pub(crate) fn from_sorted(
        ids: Vec<DeviceId>,
        values: Vec<T>,
        default: T,
    ) -> Result<Self, FieldError> {
        if ids.len() != values.len() {
            return Err(FieldError::ValueCountMismatch {
                ids: ids.len(),
                values: values.len(),
            });
        }
        if let Some(pos) = ids.windows(2).position(|w| w[0] >= w[1]) {
            return Err(FieldError::UnsortedIds(pos + 1));
        }
        Ok(Self {
            ids,
            values,
            default,
        })
    }

    /// Build from vectors already known to be sorted and of equal length
    pub(crate) fn from_parts_unchecked(ids: Vec<DeviceId>, values: Vec<T>, default: T) -> Self {
        debug_assert_eq!(ids.len(), values.len());
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        Self {
            ids,
            values,
            default,
        }
    }

    /// Drop every neighbour entry, keeping only the default
    pub(crate) fn into_constant(self) -> Self {
        Self {
            ids: Vec::new(),
            values: Vec::new(),
            default: self.default,
        }
    }

    /// Value for `id`, falling back to the default
    pub fn get(&self, id: DeviceId) -> &T {
        self.view().lookup(id)
    }

    /// The default value, which is also the value on the running device
    pub fn self_value(&self) -> &T {
        &self.default
    }

    pub fn into_self_value(self) -> T {
        self.default
    }

    pub fn ids(&self) -> &[DeviceId] {
        &self.ids
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Number of explicitly listed neighbours
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no neighbour is listed explicitly
    pub fn is_constant(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over explicitly listed neighbours
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &T)> + '_ {
        self.ids.iter().copied().zip(self.values.iter())
    }

    pub fn view(&self) -> FieldView<'_, T> {
        FieldView {
            ids: &self.ids,
            values: &self.values,
            default: &self.default,
        }
    }

    /// Apply `op` pointwise, keeping the neighbour ids
    pub fn map<R>(&self, mut op: impl FnMut(&T) -> R) -> Field<R> {
        Field {
            ids: self.ids.clone(),
            values: self.values.iter().map(&mut op).collect(),
            default: op(&self.default),
        }
    }

    /// Left fold of the values of `domain`, in domain order
    ///
    /// Ids not listed in the field contribute the default. An empty domain
    /// yields the default.
    pub fn fold(&self, op: impl FnMut(T, T) -> T, domain: &[DeviceId]) -> T
    where
        T: Clone,
    {
        let view = self.view();
        fold_values(domain.iter().map(|id| view.lookup(*id).clone()), op)
            .unwrap_or_else(|| self.default.clone())
    }

    /// Like [`Field::fold`], with `seed` standing in for the value of
    /// `excluded`
    pub fn fold_except(
        &self,
        op: impl FnMut(T, T) -> T,
        seed: T,
        domain: &[DeviceId],
        excluded: DeviceId,
    ) -> T
    where
        T: Clone,
    {
        let view = self.view();
        let items = domain.iter().map(|id| {
            if *id == excluded {
                seed.clone()
            } else {
                view.lookup(*id).clone()
            }
        });
        fold_values(items, op).unwrap_or_else(|| self.default.clone())
    }
}

fn fold_values<T>(mut items: impl Iterator<Item = T>, op: impl FnMut(T, T) -> T) -> Option<T> {
    let first = items.next()?;
    Some(items.fold(first, op))
}

impl<T: Payload> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::constant(value)
    }
}

impl<T: Display> Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (id, value) in self.iter() {
            write!(f, "{}:{}, ", id, value)?;
        }
        write!(f, "*:{}}}", self.default)
    }
}

/// Borrowed view of a field, used by pointwise operators
///
/// Plain values are viewed as constant fields with no neighbour entries.
#[derive(Debug)]
pub struct FieldView<'a, T> {
    ids: &'a [DeviceId],
    values: &'a [T],
    default: &'a T,
}

impl<T> Clone for FieldView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldView<'_, T> {}

impl<'a, T> FieldView<'a, T> {
    /// A constant view over a single value
    pub fn constant(value: &'a T) -> Self {
        Self {
            ids: &[],
            values: &[],
            default: value,
        }
    }

    pub fn ids(&self) -> &'a [DeviceId] {
        self.ids
    }

    pub fn default_value(&self) -> &'a T {
        self.default
    }

    pub fn lookup(&self, id: DeviceId) -> &'a T {
        match self.ids.binary_search(&id) {
            Ok(pos) => &self.values[pos],
            Err(_) => self.default,
        }
    }
}

/// Sorted union of the neighbour ids of several views
pub(crate) fn merge_ids(lists: &[&[DeviceId]]) -> Vec<DeviceId> {
    let non_empty: Vec<&[DeviceId]> = lists.iter().copied().filter(|l| !l.is_empty()).collect();
    match non_empty.as_slice() {
        [] => Vec::new(),
        [only] => only.to_vec(),
        _ => {
            let mut ids: Vec<DeviceId> = non_empty.iter().flat_map(|l| l.iter().copied()).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        }
    }
}

/// Apply `op` pointwise over a single field
pub fn map_hood<T, R>(op: impl FnMut(&T) -> R, field: &Field<T>) -> Field<R> {
    field.map(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Field<f64> {
        Field::from_sorted(DeviceId::range(1, 3), vec![4.0, 6.0, 8.0], 2.0).unwrap()
    }

    #[test]
    fn test_constant_field() {
        let f = Field::constant(5);
        assert!(f.is_constant());
        assert_eq!(f.len(), 0);
        assert_eq!(*f.get(DeviceId(42)), 5);
        assert_eq!(*f.self_value(), 5);
        assert_eq!(Field::<i32>::from(5), f);
    }

    #[test]
    fn test_lookup_falls_back_to_default() {
        let f = sample();
        assert_eq!(*f.get(DeviceId(0)), 2.0);
        assert_eq!(*f.get(DeviceId(2)), 6.0);
        assert_eq!(*f.get(DeviceId(9)), 2.0);
    }

    #[test]
    fn test_from_sorted_validation() {
        let err = Field::from_sorted(DeviceId::range(1, 3), vec![1], 0).unwrap_err();
        assert_eq!(err, FieldError::ValueCountMismatch { ids: 3, values: 1 });

        let err = Field::from_sorted(vec![DeviceId(2), DeviceId(1)], vec![1, 2], 0).unwrap_err();
        assert_eq!(err, FieldError::UnsortedIds(1));

        let err = Field::from_sorted(vec![DeviceId(1), DeviceId(1)], vec![1, 2], 0).unwrap_err();
        assert_eq!(err, FieldError::UnsortedIds(1));
    }

    #[test]
    fn test_fold_inclusive() {
        let f = sample();
        let sum = f.fold(|a, b| a + b, &DeviceId::range(0, 2));
        assert_eq!(sum, 12.0);
    }

    #[test]
    fn test_fold_exclusive() {
        let f = sample();
        let sum = f.fold_except(|a, b| a + b, 5.0, &DeviceId::range(0, 2), DeviceId(2));
        assert_eq!(sum, 11.0);
    }

    #[test]
    fn test_fold_empty_domain_yields_self_value() {
        let f = sample();
        assert_eq!(f.fold(|a, b| a + b, &[]), 2.0);
        assert_eq!(f.fold_except(|a, b| a + b, 5.0, &[], DeviceId(1)), 2.0);
    }

    #[test]
    fn test_fold_respects_domain_order() {
        let f = Field::from_sorted(
            DeviceId::range(1, 3),
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            "_".to_string(),
        )
        .unwrap();
        let joined = f.fold(|a, b| a + &b, &[DeviceId(3), DeviceId(1), DeviceId(7)]);
        assert_eq!(joined, "ca_");
    }

    #[test]
    fn test_map_hood() {
        let f = sample();
        let doubled = map_hood(|x: &f64| x * 2.0, &f);
        assert_eq!(doubled.ids(), f.ids());
        assert_eq!(doubled.values(), &[8.0, 12.0, 16.0]);
        assert_eq!(*doubled.self_value(), 4.0);
    }

    #[test]
    fn test_merge_ids() {
        let a = [DeviceId(1), DeviceId(3)];
        let b = [DeviceId(2), DeviceId(3), DeviceId(5)];
        let lists: [&[DeviceId]; 3] = [&a, &b, &[]];
        assert_eq!(
            merge_ids(&lists),
            vec![DeviceId(1), DeviceId(2), DeviceId(3), DeviceId(5)]
        );
        let lists: [&[DeviceId]; 2] = [&[], &a];
        assert_eq!(merge_ids(&lists), a.to_vec());
        assert!(merge_ids(&[]).is_empty());
    }

    #[test]
    fn test_display() {
        let f = Field::from_sorted(vec![DeviceId(1)], vec![3], 0).unwrap();
        assert_eq!(f.to_string(), "{1:3, *:0}");
        assert_eq!(Field::constant(7).to_string(), "{*:7}");
    }

    #[test]
    fn test_serde_roundtrip_and_validation() {
        let f = sample();
        let json = serde_json::to_string(&f).unwrap();
        let back: Field<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);

        let bad = r#"{"ids":[2,1],"values":[1.0,2.0],"default":0.0}"#;
        assert!(serde_json::from_str::<Field<f64>>(bad).is_err());
    }
}
