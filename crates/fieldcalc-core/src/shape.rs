//! Tier inference over heterogeneous types
//!
//! [`Tiered`] describes, for any operand shape, the tier of the placed values
//! it contains, the payload obtained by stripping placement, and the combined
//! placement bounds. Tuples combine their elements with [`Meet`]; arrays
//! inherit the bounds of their element. Plain values contribute
//! [`Everywhere`] and fields contribute [`Shared`].
//!
//! Everything here is resolved by the compiler.

use std::marker::PhantomData;

use crate::device::DeviceId;
use crate::field::{Field, Payload};
use crate::placed::Placed;
use crate::tier::{Everywhere, Meet, Placement, Shared, Tier, NO_TIERS};

/// Placement metadata of a type
pub trait Tiered {
    /// Tier of the first placed value found, or 0 when there is none
    const TIER: Tier;

    /// Whether placed values of different tiers occur
    const MIXED: bool;

    /// The type with placement and fields stripped
    type Value;

    /// Combined placement bounds
    type Bounds: Placement;
}

/// A plain value of any payload type, for use as a pointwise operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Local<T>(pub T);

impl<T> Local<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

const fn first_tier(a: Tier, b: Tier) -> Tier {
    if a != NO_TIERS { a } else { b }
}

const fn clash(a: Tier, b: Tier) -> bool {
    a != NO_TIERS && b != NO_TIERS && a != b
}

macro_rules! impl_tiered_leaf {
    ($($t:ty),* $(,)?) => {
        $(
            impl Tiered for $t {
                const TIER: Tier = NO_TIERS;
                const MIXED: bool = false;
                type Value = $t;
                type Bounds = Everywhere;
            }
        )*
    };
}

impl_tiered_leaf!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, DeviceId,
);

impl<T: Payload> Tiered for Vec<T> {
    const TIER: Tier = NO_TIERS;
    const MIXED: bool = false;
    type Value = Vec<T>;
    type Bounds = Everywhere;
}

impl<T: Payload> Tiered for Option<T> {
    const TIER: Tier = NO_TIERS;
    const MIXED: bool = false;
    type Value = Option<T>;
    type Bounds = Everywhere;
}

impl<T: Payload> Tiered for Local<T> {
    const TIER: Tier = NO_TIERS;
    const MIXED: bool = false;
    type Value = T;
    type Bounds = Everywhere;
}

impl<T: Payload> Tiered for Field<T> {
    const TIER: Tier = NO_TIERS;
    const MIXED: bool = false;
    type Value = T;
    type Bounds = Shared;
}

impl<const BIT: Tier, T: Payload, S: Placement> Tiered for Placed<BIT, T, S> {
    const TIER: Tier = BIT;
    const MIXED: bool = false;
    type Value = T;
    type Bounds = S;
}

impl<X: Tiered + ?Sized> Tiered for &X {
    const TIER: Tier = X::TIER;
    const MIXED: bool = X::MIXED;
    type Value = X::Value;
    type Bounds = X::Bounds;
}

impl<X: Tiered + ?Sized> Tiered for &mut X {
    const TIER: Tier = X::TIER;
    const MIXED: bool = X::MIXED;
    type Value = X::Value;
    type Bounds = X::Bounds;
}

impl<A: Tiered, const N: usize> Tiered for [A; N] {
    const TIER: Tier = A::TIER;
    const MIXED: bool = A::MIXED;
    type Value = [A::Value; N];
    type Bounds = A::Bounds;
}

impl<A: Tiered> Tiered for (A,) {
    const TIER: Tier = A::TIER;
    const MIXED: bool = A::MIXED;
    type Value = (A::Value,);
    type Bounds = A::Bounds;
}

impl<A: Tiered, B: Tiered> Tiered for (A, B) {
    const TIER: Tier = first_tier(A::TIER, B::TIER);
    const MIXED: bool = A::MIXED || B::MIXED || clash(A::TIER, B::TIER);
    type Value = (A::Value, B::Value);
    type Bounds = Meet<A::Bounds, B::Bounds>;
}

impl<A: Tiered, B: Tiered, C: Tiered> Tiered for (A, B, C) {
    const TIER: Tier = first_tier(A::TIER, <(B, C)>::TIER);
    const MIXED: bool = A::MIXED || <(B, C)>::MIXED || clash(A::TIER, <(B, C)>::TIER);
    type Value = (A::Value, B::Value, C::Value);
    type Bounds = Meet<A::Bounds, <(B, C) as Tiered>::Bounds>;
}

impl<A: Tiered, B: Tiered, C: Tiered, D: Tiered> Tiered for (A, B, C, D) {
    const TIER: Tier = first_tier(A::TIER, <(B, C, D)>::TIER);
    const MIXED: bool = A::MIXED || <(B, C, D)>::MIXED || clash(A::TIER, <(B, C, D)>::TIER);
    type Value = (A::Value, B::Value, C::Value, D::Value);
    type Bounds = Meet<A::Bounds, <(B, C, D) as Tiered>::Bounds>;
}

/// Tier of the first placed value inside `X`, or 0
pub const fn extract_tier<X: Tiered + ?Sized>() -> Tier {
    X::TIER
}

/// Whether `X` contains a placed value
pub const fn is_placed<X: Tiered + ?Sized>() -> bool {
    X::TIER != NO_TIERS
}

/// The placed type a value of shape `X` collapses to on tier `TIER`
pub type ToPlaced<const TIER: Tier, X> =
    Placed<TIER, <X as Tiered>::Value, <X as Tiered>::Bounds>;

struct SingleTier<const TIER: Tier, X: ?Sized>(PhantomData<X>);

impl<const TIER: Tier, X: Tiered + ?Sized> SingleTier<TIER, X> {
    const CHECK: () = assert!(
        !X::MIXED && (X::TIER == NO_TIERS || X::TIER == TIER),
        "mixing up different tiers in one placed shape"
    );
}

/// `(p, q)` of [`ToPlaced<TIER, X>`]
///
/// Fails to compile when `X` mixes tiers or carries a tier other than `TIER`.
///
/// ```
/// use fieldcalc_core::{to_placed_bounds, Placed, Pq};
///
/// const B: (u32, u32) = to_placed_bounds::<8, (Placed<8, i32, Pq<12, 2>>, i32)>();
/// assert_eq!(B, (12, 2));
/// ```
///
/// ```compile_fail
/// use fieldcalc_core::{to_placed_bounds, Placed};
///
/// const B: (u32, u32) = to_placed_bounds::<8, (Placed<8, i32>, Placed<16, i32>)>();
/// ```
pub const fn to_placed_bounds<const TIER: Tier, X: Tiered + ?Sized>() -> (Tier, Tier) {
    let () = SingleTier::<TIER, X>::CHECK;
    (
        <X::Bounds as Placement>::P_MASK,
        <X::Bounds as Placement>::Q_MASK,
    )
}
