//! Placed values
//!
//! A [`Placed<TIER, T, S>`] is a value computed by a device of atomic tier
//! `TIER` under placement bounds `S = (p, q)`:
//!
//! - the value exists only when `TIER & p != 0`, which is known at compile
//!   time and selects the storage of the inner [`Opt`]
//! - neighbour values are visible only from tiers in `q`; with `q = 0` the
//!   stored field is constant and carries no neighbour entries
//!
//! Placed values are built by [`Placed::new`] (a plain value that exists
//! wherever the bounds allow), by the operators in [`crate::hood`], or from
//! received neighbour data through [`crate::neighborhood`].

use std::any::type_name;
use std::fmt::{self, Display};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::field::{Field, Payload};
use crate::opt::{Gate, Opt};
use crate::tier::{Dual, Everywhere, Placement, Tier, bitsubset, is_atomic};

/// A value of tier `TIER` with existence and visibility bounds `S`
///
/// `TIER` must have exactly one bit set:
///
/// ```compile_fail
/// use fieldcalc_core::Placed;
///
/// let _: Placed<12, i32> = Placed::new(1);
/// ```
///
/// Payloads are plain values; fields and placed values do not nest:
///
/// ```compile_fail
/// use fieldcalc_core::{Field, Placed};
///
/// let _: Placed<8, Field<i32>> = Placed::new(Field::constant(1));
/// ```
pub struct Placed<const TIER: Tier, T, S: Placement = Everywhere> {
    data: Opt<Field<T>, Gate<TIER, S>>,
}

struct Narrowing<A, B>(PhantomData<(A, B)>);

impl<A: Placement, B: Placement> Narrowing<A, B> {
    const CHECK: () = assert!(
        bitsubset(B::P_MASK, A::P_MASK) && bitsubset(A::Q_MASK, B::Q_MASK),
        "placed conversion may only shrink existence and grow visibility"
    );
}

impl<const TIER: Tier, T: Payload, S: Placement> Placed<TIER, T, S> {
    const VALID: () = assert!(is_atomic(TIER), "placed tier must have exactly one bit set");

    const CLOSED: () = assert!(
        TIER & S::P_MASK == 0,
        "absent() requires bounds that exclude the device tier"
    );

    const DUAL_WITHIN: () = assert!(
        bitsubset(S::Q_MASK, S::P_MASK),
        "the dual must exist only where the value itself exists"
    );

    /// Tier of the device running the program
    pub const TIER_VALUE: Tier = TIER;
    /// Tiers on which the value exists
    pub const P_MASK: Tier = S::P_MASK;
    /// Tiers whose neighbour values are visible
    pub const Q_MASK: Tier = S::Q_MASK;
    /// Whether the value exists on this device
    pub const PRESENT: bool = TIER & S::P_MASK != 0;

    /// A value that exists wherever the bounds allow, taking `value` on
    /// every device
    pub fn new(value: T) -> Self {
        Self::build(move || Field::constant(value))
    }

    /// The value for bounds that exclude this device
    ///
    /// Fails to compile when the bounds include `TIER`.
    pub fn absent() -> Self {
        let () = Self::CLOSED;
        Self::build(|| -> Field<T> { unreachable!("closed gate never computes its value") })
    }

    /// Run `compute` only when the value exists on this device
    pub(crate) fn build(compute: impl FnOnce() -> Field<T>) -> Self {
        let () = Self::VALID;
        let data = Opt::from_option(None).unwrap_or_else(|| Opt::new(Self::normalize(compute())));
        Self { data }
    }

    pub(crate) fn from_field(field: Field<T>) -> Self {
        Self::build(move || field)
    }

    fn normalize(field: Field<T>) -> Field<T> {
        if S::Q_MASK == 0 {
            field.into_constant()
        } else {
            field
        }
    }

    /// `(p, q)` of this type
    pub const fn bounds() -> (Tier, Tier) {
        (S::P_MASK, S::Q_MASK)
    }

    pub fn is_present(&self) -> bool {
        !self.data.is_empty()
    }

    /// The underlying field
    ///
    /// # Panics
    ///
    /// Panics when the value does not exist on this device. Bounds with
    /// `p = ALL_TIERS` never panic; otherwise prefer [`Placed::get_or`] or
    /// [`Placed::try_get`].
    pub fn get(&self) -> &Field<T> {
        match self.data.get() {
            Some(field) => field,
            None => panic!(
                "placed value of tier {:#x} does not exist for p = {:#x}",
                TIER,
                S::P_MASK
            ),
        }
    }

    pub fn try_get(&self) -> Option<&Field<T>> {
        self.data.get()
    }

    /// Value on this device
    pub fn local(&self) -> Option<&T> {
        self.data.get().map(Field::self_value)
    }

    /// Value on this device, or `default` when the value does not exist here
    pub fn get_or(&self, default: T) -> T {
        self.local().cloned().unwrap_or(default)
    }

    /// The underlying field, or `default` when the value does not exist here
    pub fn field_or(&self, default: Field<T>) -> Field<T> {
        self.data.get_or(default)
    }

    pub fn into_field(self) -> Option<Field<T>> {
        self.data.into_option()
    }

    /// Exchange contents with another value of the same type
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.data, &mut other.data);
    }

    /// Convert payload and bounds
    ///
    /// The target existence bound must be a subset of this one
    /// (`S2::P_MASK ⊆ S::P_MASK`) and the target visibility bound a superset
    /// of this one (`S::Q_MASK ⊆ S2::Q_MASK`):
    ///
    /// ```
    /// use fieldcalc_core::{Placed, Pq};
    ///
    /// let x: Placed<8, i32, Pq<12, 2>> = Placed::new(1);
    /// let y: Placed<8, f64, Pq<8, 6>> = x.convert();
    /// assert_eq!(y.get_or(0.0), 1.0);
    /// ```
    ///
    /// Other targets fail to compile:
    ///
    /// ```compile_fail
    /// use fieldcalc_core::{Placed, Pq};
    ///
    /// let x: Placed<8, i32, Pq<12, 2>> = Placed::new(1);
    /// let _: Placed<8, i32, Pq<28, 2>> = x.convert();
    /// ```
    pub fn convert<B: Payload, S2: Placement>(self) -> Placed<TIER, B, S2>
    where
        T: Into<B>,
    {
        let () = Narrowing::<S, S2>::CHECK;
        self.retag(|field| field.map(|v| v.clone().into()))
    }

    /// Swap existence and visibility bounds
    pub fn into_dual(self) -> Placed<TIER, T, Dual<S>> {
        let () = Self::DUAL_WITHIN;
        self.retag(|field| field)
    }

    fn retag<U: Payload, S2: Placement>(
        self,
        f: impl FnOnce(Field<T>) -> Field<U>,
    ) -> Placed<TIER, U, S2> {
        let source = self.data.into_option();
        Placed::build(move || match source {
            Some(field) => f(field),
            None => unreachable!("target bounds exist only where the source exists"),
        })
    }
}

impl<const TIER: Tier, T: Payload + Default, S: Placement> Default for Placed<TIER, T, S> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<const TIER: Tier, T: Payload, S: Placement> Clone for Placed<TIER, T, S> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<const TIER: Tier, T: Payload + PartialEq, S: Placement> PartialEq for Placed<TIER, T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<const TIER: Tier, T: Payload + fmt::Debug, S: Placement> fmt::Debug for Placed<TIER, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placed")
            .field("tier", &TIER)
            .field("p", &S::P_MASK)
            .field("q", &S::Q_MASK)
            .field("data", &self.data)
            .finish()
    }
}

impl<const TIER: Tier, T: Payload + Display, S: Placement> Display for Placed<TIER, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.get() {
            Some(field) if S::Q_MASK == 0 => write!(f, "{}", field.self_value())?,
            Some(field) => write!(f, "{}", field)?,
            None => write!(f, "<{}>", type_name::<T>())?,
        }
        write!(f, "@{},{}", S::P_MASK, S::Q_MASK)
    }
}

impl<const TIER: Tier, T: Payload + Serialize, S: Placement> Serialize for Placed<TIER, T, S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de, const TIER: Tier, T, S> Deserialize<'de> for Placed<TIER, T, S>
where
    T: Payload + Deserialize<'de>,
    S: Placement,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let () = Self::VALID;
        let data = Opt::<Field<T>, Gate<TIER, S>>::deserialize(deserializer)?;
        Ok(Self {
            data: data.map(Self::normalize),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;
    use crate::tier::{ALL_TIERS, Pq};

    #[test]
    fn test_constructors() {
        let fd: Placed<8, f64, Pq<255, 0>> = Placed::default();
        let x: Placed<8, f64, Pq<255, 0>> = Placed::new(1.5);
        assert_eq!(*fd.get().self_value(), 0.0);
        assert_eq!(x.get_or(3.0), 1.5);
        assert!(x.is_present());
        assert_eq!(x.local(), Some(&1.5));

        let closed: Placed<8, f64, Pq<6, 0>> = Placed::new(1.5);
        assert!(!closed.is_present());
        assert_eq!(closed.get_or(3.0), 3.0);
        assert!(closed.try_get().is_none());
        assert_eq!(closed, Placed::absent());
    }

    #[test]
    fn test_bounds_consts() {
        type X = Placed<8, i32, Pq<12, 2>>;
        assert_eq!(X::bounds(), (12, 2));
        assert_eq!(X::TIER_VALUE, 8);
        assert_eq!(X::P_MASK, 12);
        assert_eq!(X::Q_MASK, 2);
        assert!(X::PRESENT);
        assert_eq!(Placed::<8, i32>::bounds(), (ALL_TIERS, 0));
    }

    #[test]
    fn test_convert_narrowing() {
        let x: Placed<8, i32, Pq<255, 0>> = Placed::new(4);
        let y: Placed<8, f64, Pq<11, 6>> = x.clone().convert();
        assert_eq!(y.get_or(0.0), 4.0);

        let z: Placed<8, i64, Pq<6, 6>> = x.convert();
        assert!(!z.is_present());
    }

    #[test]
    fn test_convert_keeps_neighbours() {
        let field = Field::from_sorted(vec![DeviceId(1)], vec![3], 1).unwrap();
        let x: Placed<8, i32, Pq<12, 2>> = Placed::from_field(field);
        let y: Placed<8, i64, Pq<8, 6>> = x.convert();
        assert_eq!(y.get().len(), 1);
        assert_eq!(*y.get().get(DeviceId(1)), 3);
    }

    #[test]
    fn test_zero_visibility_strips_neighbours() {
        let field = Field::from_sorted(vec![DeviceId(1)], vec![3], 1).unwrap();
        let x: Placed<8, i32, Pq<12, 0>> = Placed::from_field(field);
        assert!(x.get().is_constant());
        assert_eq!(x.get_or(0), 1);
    }

    #[test]
    fn test_into_dual() {
        let x: Placed<8, i32, Pq<12, 8>> = Placed::new(2);
        let d = x.into_dual();
        assert_eq!(Placed::<8, i32, Dual<Pq<12, 8>>>::bounds(), (8, 12));
        assert_eq!(d.get_or(0), 2);

        let x: Placed<8, i32, Pq<12, 4>> = Placed::new(2);
        let d = x.into_dual();
        assert!(!d.is_present());
    }

    #[test]
    fn test_swap() {
        let mut a: Placed<8, i32, Pq<12, 2>> = Placed::new(1);
        let mut b: Placed<8, i32, Pq<12, 2>> = Placed::new(2);
        a.swap(&mut b);
        assert_eq!(a.get_or(0), 2);
        assert_eq!(b.get_or(0), 1);
    }

    #[test]
    fn test_field_or() {
        let closed: Placed<8, i32, Pq<4, 8>> = Placed::absent();
        assert_eq!(closed.field_or(Field::constant(9)), Field::constant(9));
        let open: Placed<8, i32, Pq<8, 8>> = Placed::new(1);
        assert_eq!(open.field_or(Field::constant(9)), Field::constant(1));
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn test_get_panics_when_absent() {
        let closed: Placed<8, i32, Pq<4, 0>> = Placed::absent();
        let _ = closed.get();
    }

    #[test]
    fn test_display() {
        let x: Placed<8, i32, Pq<12, 0>> = Placed::new(5);
        assert_eq!(x.to_string(), "5@12,0");

        let closed: Placed<8, i32, Pq<4, 0>> = Placed::absent();
        assert_eq!(closed.to_string(), "<i32>@4,0");

        let field = Field::from_sorted(vec![DeviceId(2)], vec![7], 5).unwrap();
        let f: Placed<8, i32, Pq<8, 8>> = Placed::from_field(field);
        assert_eq!(f.to_string(), "{2:7, *:5}@8,8");
    }

    #[test]
    fn test_serde_roundtrip() {
        let x: Placed<8, i32, Pq<12, 2>> = Placed::new(5);
        let bytes = postcard::to_allocvec(&x).unwrap();
        let back: Placed<8, i32, Pq<12, 2>> = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back, x);

        let closed: Placed<8, i32, Pq<4, 2>> = Placed::absent();
        assert!(postcard::to_allocvec(&closed).unwrap().is_empty());
        let back: Placed<8, i32, Pq<4, 2>> = postcard::from_bytes(&[]).unwrap();
        assert_eq!(back, closed);
    }
}
