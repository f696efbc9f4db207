//! Tier bitmasks and placement bounds
//!
//! Every device belongs to exactly one tier, represented by a single bit of a
//! [`Tier`] mask. Sets of tiers are plain masks combined with bitwise
//! operators.
//!
//! Placement bounds `(p, q)` are carried at the type level by implementors of
//! [`Placement`]:
//!
//! - `p` is the set of tiers on which a value *exists*
//! - `q` is the set of tiers from which neighbour values are *visible*
//!
//! Bounds are combined by the compiler through [`Meet`], [`Cover`], [`Dual`]
//! and [`Reduced`], so code that never touches placed values pays nothing for
//! them.

use std::fmt::{self, Display};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::TierError;

/// Bitmask of device tiers
pub type Tier = u32;

/// Every tier
pub const ALL_TIERS: Tier = !0;

/// No tier
pub const NO_TIERS: Tier = 0;

/// Number of distinct atomic tiers representable in a [`Tier`]
pub const TIER_BITS: u32 = Tier::BITS;

/// Whether `tier` has exactly one bit set
pub const fn is_atomic(tier: Tier) -> bool {
    tier != 0 && tier & (tier - 1) == 0
}

/// Whether every bit of `x` is also set in `y`
pub const fn bitsubset(x: Tier, y: Tier) -> bool {
    x & !y == 0
}

/// Bitwise intersection of a list of tier sets (all tiers for an empty list)
pub const fn tier_inf(tiers: &[Tier]) -> Tier {
    let mut acc = ALL_TIERS;
    let mut i = 0;
    while i < tiers.len() {
        acc &= tiers[i];
        i += 1;
    }
    acc
}

/// Bitwise union of a list of tier sets (no tiers for an empty list)
pub const fn tier_sup(tiers: &[Tier]) -> Tier {
    let mut acc = NO_TIERS;
    let mut i = 0;
    while i < tiers.len() {
        acc |= tiers[i];
        i += 1;
    }
    acc
}

/// A validated atomic tier, i.e. the tier of a concrete device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TierBit(Tier);

impl TierBit {
    /// Validate a raw mask as an atomic tier
    pub fn new(raw: Tier) -> Result<Self, TierError> {
        if is_atomic(raw) {
            Ok(Self(raw))
        } else {
            Err(TierError::NotAtomic(raw))
        }
    }

    /// The tier with bit `index` set
    pub fn from_index(index: u32) -> Result<Self, TierError> {
        if index < TIER_BITS {
            Ok(Self(1 << index))
        } else {
            Err(TierError::OutOfRange {
                index,
                max: TIER_BITS,
            })
        }
    }

    /// The underlying mask
    pub const fn mask(&self) -> Tier {
        self.0
    }

    /// Position of the set bit
    pub const fn index(&self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Whether this tier belongs to the set `tiers`
    pub const fn within(&self, tiers: Tier) -> bool {
        self.0 & tiers != 0
    }
}

impl TryFrom<u32> for TierBit {
    type Error = TierError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<TierBit> for u32 {
    fn from(bit: TierBit) -> Self {
        bit.0
    }
}

impl Display for TierBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier#{}", self.index())
    }
}

// ============================================================================
// Placement bounds
// ============================================================================

/// Type-level placement bounds `(p, q)`
pub trait Placement: 'static {
    /// Tiers on which the value exists
    const P_MASK: Tier;
    /// Tiers whose neighbour values are visible
    const Q_MASK: Tier;
}

/// Literal bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pq<const P: Tier, const Q: Tier>;

impl<const P: Tier, const Q: Tier> Placement for Pq<P, Q> {
    const P_MASK: Tier = P;
    const Q_MASK: Tier = Q;
}

/// Exists everywhere, sees no neighbours: the bounds of a plain local value
pub type Everywhere = Pq<ALL_TIERS, NO_TIERS>;

/// Exists everywhere, sees every neighbour: the bounds of a plain field
pub type Shared = Pq<ALL_TIERS, ALL_TIERS>;

/// Bounds of a pointwise combination: exists where both exist, sees what
/// either sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meet<A, B>(PhantomData<(A, B)>);

impl<A: Placement, B: Placement> Placement for Meet<A, B> {
    const P_MASK: Tier = A::P_MASK & B::P_MASK;
    const Q_MASK: Tier = A::Q_MASK | B::Q_MASK;
}

/// Bounds of a first-present choice: exists where either exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cover<A, B>(PhantomData<(A, B)>);

impl<A: Placement, B: Placement> Placement for Cover<A, B> {
    const P_MASK: Tier = A::P_MASK | B::P_MASK;
    const Q_MASK: Tier = A::Q_MASK | B::Q_MASK;
}

/// Swapped bounds: exists where `S` is visible from, visible from where `S`
/// exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dual<S>(PhantomData<S>);

impl<S: Placement> Placement for Dual<S> {
    const P_MASK: Tier = S::Q_MASK;
    const Q_MASK: Tier = S::P_MASK;
}

/// Bounds after a reduction over neighbours: same existence, nothing visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reduced<S>(PhantomData<S>);

impl<S: Placement> Placement for Reduced<S> {
    const P_MASK: Tier = S::P_MASK;
    const Q_MASK: Tier = NO_TIERS;
}

/// Evaluate bounds as a `(p, q)` pair
pub const fn bounds<S: Placement>() -> (Tier, Tier) {
    (S::P_MASK, S::Q_MASK)
}

/// Whether a value with bounds `S` exists on a device of tier `tier`
pub const fn exists_on<S: Placement>(tier: Tier) -> bool {
    tier & S::P_MASK != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_atomic() {
        assert!(is_atomic(1));
        assert!(is_atomic(8));
        assert!(is_atomic(1 << 31));
        assert!(!is_atomic(0));
        assert!(!is_atomic(12));
        assert!(!is_atomic(ALL_TIERS));
    }

    #[test]
    fn test_bitsubset() {
        assert!(bitsubset(0, 0));
        assert!(bitsubset(4, 12));
        assert!(bitsubset(12, ALL_TIERS));
        assert!(!bitsubset(12, 4));
        assert!(!bitsubset(ALL_TIERS, 255));
    }

    #[test]
    fn test_tier_inf_sup() {
        assert_eq!(tier_inf(&[7, 14, 28]), 4);
        assert_eq!(tier_sup(&[7, 14, 28]), 31);
        assert_eq!(tier_inf(&[]), ALL_TIERS);
        assert_eq!(tier_sup(&[]), NO_TIERS);
        assert_eq!(tier_inf(&[12]), 12);
    }

    #[test]
    fn test_tier_bit_validation() {
        assert_eq!(TierBit::new(8).map(|b| b.index()), Ok(3));
        assert_eq!(TierBit::new(6), Err(TierError::NotAtomic(6)));
        assert_eq!(TierBit::new(0), Err(TierError::NotAtomic(0)));
        assert_eq!(TierBit::from_index(4).map(|b| b.mask()), Ok(16));
        assert!(matches!(
            TierBit::from_index(32),
            Err(TierError::OutOfRange { index: 32, .. })
        ));
    }

    #[test]
    fn test_tier_bit_within() {
        let bit = TierBit::new(8).unwrap();
        assert!(bit.within(12));
        assert!(!bit.within(6));
        assert!(bit.within(ALL_TIERS));
        assert_eq!(bit.to_string(), "tier#3");
    }

    #[test]
    fn test_tier_bit_serde_rejects_non_atomic() {
        let ok: TierBit = serde_json::from_str("4").unwrap();
        assert_eq!(ok.mask(), 4);
        assert!(serde_json::from_str::<TierBit>("5").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "4");
    }

    #[test]
    fn test_bound_combinators() {
        type X = Pq<12, 2>;
        type Y = Pq<24, 4>;
        assert_eq!(bounds::<Meet<X, Y>>(), (8, 6));
        assert_eq!(bounds::<Cover<X, Y>>(), (28, 6));
        assert_eq!(bounds::<Dual<X>>(), (2, 12));
        assert_eq!(bounds::<Reduced<Meet<X, Y>>>(), (8, 0));
        assert_eq!(bounds::<Meet<Everywhere, X>>(), (12, 2));
        assert_eq!(bounds::<Meet<Shared, X>>(), (12, ALL_TIERS));
    }

    #[test]
    fn test_exists_on() {
        assert!(exists_on::<Pq<12, 0>>(8));
        assert!(!exists_on::<Pq<6, 0>>(8));
        assert!(exists_on::<Everywhere>(1 << 20));
    }
}
