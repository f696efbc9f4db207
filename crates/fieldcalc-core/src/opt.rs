//! Optional storage with compile-time or runtime presence
//!
//! [`Opt<T, M>`] holds zero or one `T`. The presence mode `M` decides how much
//! of that is known statically:
//!
//! - [`Never`]: always empty, stores nothing
//! - [`Always`]: always holds a value, no presence flag
//! - [`Runtime`]: toggles at runtime like `Option<T>`
//! - [`Gate<TIER, S>`]: fixed for a device of tier `TIER`, present iff
//!   `TIER` lies in the existence set of the bounds `S`
//!
//! The mode is part of the type, so the serialized form only carries a
//! presence flag for [`Runtime`].

use std::fmt;
use std::marker::PhantomData;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tier::{Placement, Tier};

/// Storage strategy of an [`Opt`]
pub trait Presence: 'static {
    /// Concrete storage for a payload of type `T`
    type Slot<T>;

    /// `Some(present)` when presence is fixed by the mode, `None` when it
    /// is decided at runtime
    const FIXED: Option<bool>;

    /// Store a value, discarding it when the mode never holds one
    fn fill<T>(value: T) -> Self::Slot<T>;

    /// Build a slot from an `Option`, or `None` when the option contradicts
    /// the fixed presence of the mode
    fn from_option<T>(value: Option<T>) -> Option<Self::Slot<T>>;

    fn as_option<T>(slot: &Self::Slot<T>) -> Option<&T>;

    fn as_option_mut<T>(slot: &mut Self::Slot<T>) -> Option<&mut T>;

    fn into_option<T>(slot: Self::Slot<T>) -> Option<T>;

    fn map<T, U>(slot: Self::Slot<T>, f: impl FnOnce(T) -> U) -> Self::Slot<U>;

    fn map_ref<T, U>(slot: &Self::Slot<T>, f: impl FnOnce(&T) -> U) -> Self::Slot<U>;
}

/// Never holds a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Never;

/// Always holds a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Always;

/// Holds a value or not, decided at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Runtime;

/// Present iff `TIER & S::P_MASK != 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gate<const TIER: Tier, S>(PhantomData<S>);

impl Presence for Never {
    type Slot<T> = PhantomData<T>;
    const FIXED: Option<bool> = Some(false);

    fn fill<T>(_value: T) -> Self::Slot<T> {
        PhantomData
    }

    fn from_option<T>(value: Option<T>) -> Option<Self::Slot<T>> {
        match value {
            None => Some(PhantomData),
            Some(_) => None,
        }
    }

    fn as_option<T>(_slot: &Self::Slot<T>) -> Option<&T> {
        None
    }

    fn as_option_mut<T>(_slot: &mut Self::Slot<T>) -> Option<&mut T> {
        None
    }

    fn into_option<T>(_slot: Self::Slot<T>) -> Option<T> {
        None
    }

    fn map<T, U>(_slot: Self::Slot<T>, _f: impl FnOnce(T) -> U) -> Self::Slot<U> {
        PhantomData
    }

    fn map_ref<T, U>(_slot: &Self::Slot<T>, _f: impl FnOnce(&T) -> U) -> Self::Slot<U> {
        PhantomData
    }
}

impl Presence for Always {
    type Slot<T> = T;
    const FIXED: Option<bool> = Some(true);

    fn fill<T>(value: T) -> Self::Slot<T> {
        value
    }

    fn from_option<T>(value: Option<T>) -> Option<Self::Slot<T>> {
        value
    }

    fn as_option<T>(slot: &Self::Slot<T>) -> Option<&T> {
        Some(slot)
    }

    fn as_option_mut<T>(slot: &mut Self::Slot<T>) -> Option<&mut T> {
        Some(slot)
    }

    fn into_option<T>(slot: Self::Slot<T>) -> Option<T> {
        Some(slot)
    }

    fn map<T, U>(slot: Self::Slot<T>, f: impl FnOnce(T) -> U) -> Self::Slot<U> {
        f(slot)
    }

    fn map_ref<T, U>(slot: &Self::Slot<T>, f: impl FnOnce(&T) -> U) -> Self::Slot<U> {
        f(slot)
    }
}

impl Presence for Runtime {
    type Slot<T> = Option<T>;
    const FIXED: Option<bool> = None;

    fn fill<T>(value: T) -> Self::Slot<T> {
        Some(value)
    }

    fn from_option<T>(value: Option<T>) -> Option<Self::Slot<T>> {
        Some(value)
    }

    fn as_option<T>(slot: &Self::Slot<T>) -> Option<&T> {
        slot.as_ref()
    }

    fn as_option_mut<T>(slot: &mut Self::Slot<T>) -> Option<&mut T> {
        slot.as_mut()
    }

    fn into_option<T>(slot: Self::Slot<T>) -> Option<T> {
        slot
    }

    fn map<T, U>(slot: Self::Slot<T>, f: impl FnOnce(T) -> U) -> Self::Slot<U> {
        slot.map(f)
    }

    fn map_ref<T, U>(slot: &Self::Slot<T>, f: impl FnOnce(&T) -> U) -> Self::Slot<U> {
        slot.as_ref().map(f)
    }
}

impl<const TIER: Tier, S: Placement> Gate<TIER, S> {
    /// Whether the gate is open for this tier
    pub const OPEN: bool = TIER & S::P_MASK != 0;
}

// The slot of a gate is `Some` exactly when the gate is open.
impl<const TIER: Tier, S: Placement> Presence for Gate<TIER, S> {
    type Slot<T> = Option<T>;
    const FIXED: Option<bool> = Some(Self::OPEN);

    fn fill<T>(value: T) -> Self::Slot<T> {
        if Self::OPEN { Some(value) } else { None }
    }

    fn from_option<T>(value: Option<T>) -> Option<Self::Slot<T>> {
        (value.is_some() == Self::OPEN).then_some(value)
    }

    fn as_option<T>(slot: &Self::Slot<T>) -> Option<&T> {
        slot.as_ref()
    }

    fn as_option_mut<T>(slot: &mut Self::Slot<T>) -> Option<&mut T> {
        slot.as_mut()
    }

    fn into_option<T>(slot: Self::Slot<T>) -> Option<T> {
        slot
    }

    fn map<T, U>(slot: Self::Slot<T>, f: impl FnOnce(T) -> U) -> Self::Slot<U> {
        slot.map(f)
    }

    fn map_ref<T, U>(slot: &Self::Slot<T>, f: impl FnOnce(&T) -> U) -> Self::Slot<U> {
        slot.as_ref().map(f)
    }
}

// ============================================================================
// Opt
// ============================================================================

/// Zero or one value of type `T`, with presence governed by `M`
pub struct Opt<T, M: Presence = Runtime> {
    slot: M::Slot<T>,
}

impl<T, M: Presence> Opt<T, M> {
    /// Number of held values when fixed by the mode
    pub const STATIC_SIZE: Option<usize> = match M::FIXED {
        Some(true) => Some(1),
        Some(false) => Some(0),
        None => None,
    };

    /// Store a value (dropped immediately when the mode never holds one)
    pub fn new(value: T) -> Self {
        Self { slot: M::fill(value) }
    }

    /// Build from an `Option`, failing when it contradicts a fixed mode
    pub fn from_option(value: Option<T>) -> Option<Self> {
        M::from_option(value).map(|slot| Self { slot })
    }

    pub fn get(&self) -> Option<&T> {
        M::as_option(&self.slot)
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        M::as_option_mut(&mut self.slot)
    }

    pub fn into_option(self) -> Option<T> {
        M::into_option(self.slot)
    }

    /// Number of held values, 0 or 1
    pub fn size(&self) -> usize {
        usize::from(self.get().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    /// The held value, or `default` when empty
    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.get().cloned().unwrap_or(default)
    }

    pub fn iter(&self) -> std::option::IntoIter<&T> {
        self.get().into_iter()
    }

    pub fn iter_mut(&mut self) -> std::option::IntoIter<&mut T> {
        self.get_mut().into_iter()
    }

    /// Convert the payload, keeping the mode
    pub fn convert<B>(self) -> Opt<B, M>
    where
        T: Into<B>,
    {
        Opt {
            slot: M::map(self.slot, Into::into),
        }
    }

    /// Apply `f` to the payload, keeping the mode
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Opt<U, M> {
        Opt {
            slot: M::map(self.slot, f),
        }
    }
}

impl<T> Opt<T, Never> {
    /// A default value, since nothing is stored
    pub fn front(&self) -> T
    where
        T: Default,
    {
        T::default()
    }

    pub fn back(&self) -> T
    where
        T: Default,
    {
        T::default()
    }
}

impl<T> Opt<T, Always> {
    pub fn front(&self) -> &T {
        &self.slot
    }

    pub fn front_mut(&mut self) -> &mut T {
        &mut self.slot
    }

    pub fn back(&self) -> &T {
        &self.slot
    }

    pub fn into_inner(self) -> T {
        self.slot
    }
}

impl<T> Opt<T, Runtime> {
    pub fn none() -> Self {
        Self { slot: None }
    }

    /// The held value
    ///
    /// # Panics
    ///
    /// Panics when empty. Use [`Opt::get`] or [`Opt::get_or`] when presence
    /// is not guaranteed by the caller.
    pub fn front(&self) -> &T {
        match &self.slot {
            Some(value) => value,
            None => panic!("front() called on an empty Opt"),
        }
    }

    /// # Panics
    ///
    /// Panics when empty.
    pub fn front_mut(&mut self) -> &mut T {
        match &mut self.slot {
            Some(value) => value,
            None => panic!("front_mut() called on an empty Opt"),
        }
    }

    pub fn back(&self) -> &T {
        self.front()
    }

    /// Store a value, replacing any previous one
    pub fn emplace(&mut self, value: T) -> &mut T {
        self.slot.insert(value)
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn take(&mut self) -> Option<T> {
        self.slot.take()
    }
}

impl<T> From<T> for Opt<T, Runtime> {
    fn from(value: T) -> Self {
        Self { slot: Some(value) }
    }
}

impl<T: Default, M: Presence> Default for Opt<T, M> {
    fn default() -> Self {
        let slot = M::from_option(None).unwrap_or_else(|| M::fill(T::default()));
        Self { slot }
    }
}

impl<T: Clone, M: Presence> Clone for Opt<T, M> {
    fn clone(&self) -> Self {
        Self {
            slot: M::map_ref(&self.slot, T::clone),
        }
    }
}

impl<T: PartialEq, M: Presence> PartialEq for Opt<T, M> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: Eq, M: Presence> Eq for Opt<T, M> {}

impl<T: fmt::Debug, M: Presence> fmt::Debug for Opt<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Opt").field(value).finish(),
            None => f.write_str("Opt(-)"),
        }
    }
}

impl<T, M: Presence> IntoIterator for Opt<T, M> {
    type Item = T;
    type IntoIter = std::option::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_option().into_iter()
    }
}

impl<'a, T, M: Presence> IntoIterator for &'a Opt<T, M> {
    type Item = &'a T;
    type IntoIter = std::option::IntoIter<&'a T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, M: Presence> IntoIterator for &'a mut Opt<T, M> {
    type Item = &'a mut T;
    type IntoIter = std::option::IntoIter<&'a mut T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: Serialize, M: Presence> Serialize for Opt<T, M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (M::FIXED, self.get()) {
            (Some(false), _) => serializer.serialize_unit(),
            (Some(true), Some(value)) => value.serialize(serializer),
            (Some(true), None) => Err(S::Error::custom("fixed-present Opt holds no value")),
            (None, value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>, M: Presence> Deserialize<'de> for Opt<T, M> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match M::FIXED {
            Some(false) => {
                <()>::deserialize(deserializer)?;
                None
            }
            Some(true) => Some(T::deserialize(deserializer)?),
            None => Option::<T>::deserialize(deserializer)?,
        };
        Self::from_option(value)
            .ok_or_else(|| D::Error::custom("decoded presence does not match the storage mode"))
    }
}
