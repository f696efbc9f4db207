//! Pointwise and reduction operators over fields and placed values
//!
//! [`pmap_hood`] applies an operator to a tuple of operands. Each operand is
//! classified by an [`OperandKind`] and the kinds are joined to pick the
//! result type:
//!
//! | operands                   | result                         |
//! |----------------------------|--------------------------------|
//! | only plain values          | `R`                            |
//! | some field, none placed    | `Field<R>`                     |
//! | some `Placed<TIER, _, _>`  | `Placed<TIER, R, Meet<..>>`    |
//!
//! Placed operands of different tiers have no join and fail to compile. For
//! placed results the operator runs only when the combined bounds include
//! the device tier.

use tracing::trace;

use crate::device::DeviceId;
use crate::field::{Field, FieldView, Payload, merge_ids};
use crate::placed::Placed;
use crate::shape::{Local, Tiered};
use crate::tier::{Cover, Meet, Placement, Reduced, Tier};

// ============================================================================
// Operand kinds
// ============================================================================

/// How an operand shapes the result of a pointwise operator
pub trait OperandKind {
    /// Result type for payload `R` under bounds `S`
    type Output<R: Payload, S: Placement>;

    /// Wrap the result of `compute`, running it only when the result exists
    fn assemble<R: Payload, S: Placement>(
        compute: impl FnOnce() -> Field<R>,
    ) -> Self::Output<R, S>;
}

/// Plain values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalKind;

/// Neighbouring fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldKind;

/// Placed values of tier `TIER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlacedKind<const TIER: Tier>;

impl OperandKind for LocalKind {
    type Output<R: Payload, S: Placement> = R;

    fn assemble<R: Payload, S: Placement>(compute: impl FnOnce() -> Field<R>) -> R {
        compute().into_self_value()
    }
}

impl OperandKind for FieldKind {
    type Output<R: Payload, S: Placement> = Field<R>;

    fn assemble<R: Payload, S: Placement>(compute: impl FnOnce() -> Field<R>) -> Field<R> {
        compute()
    }
}

impl<const TIER: Tier> OperandKind for PlacedKind<TIER> {
    type Output<R: Payload, S: Placement> = Placed<TIER, R, S>;

    fn assemble<R: Payload, S: Placement>(
        compute: impl FnOnce() -> Field<R>,
    ) -> Placed<TIER, R, S> {
        trace!(
            tier = TIER,
            p = S::P_MASK,
            q = S::Q_MASK,
            present = Placed::<TIER, R, S>::PRESENT,
            "placed pointwise gate"
        );
        Placed::build(compute)
    }
}

/// Least upper bound of two operand kinds
pub trait Join<Rhs: OperandKind>: OperandKind {
    type Joined: OperandKind;
}

impl Join<LocalKind> for LocalKind {
    type Joined = LocalKind;
}

impl Join<FieldKind> for LocalKind {
    type Joined = FieldKind;
}

impl Join<LocalKind> for FieldKind {
    type Joined = FieldKind;
}

impl Join<FieldKind> for FieldKind {
    type Joined = FieldKind;
}

impl<const TIER: Tier> Join<PlacedKind<TIER>> for LocalKind {
    type Joined = PlacedKind<TIER>;
}

impl<const TIER: Tier> Join<PlacedKind<TIER>> for FieldKind {
    type Joined = PlacedKind<TIER>;
}

impl<const TIER: Tier> Join<LocalKind> for PlacedKind<TIER> {
    type Joined = PlacedKind<TIER>;
}

impl<const TIER: Tier> Join<FieldKind> for PlacedKind<TIER> {
    type Joined = PlacedKind<TIER>;
}

impl<const TIER: Tier> Join<PlacedKind<TIER>> for PlacedKind<TIER> {
    type Joined = PlacedKind<TIER>;
}

/// Joined kind of two operand kinds
pub type JoinOf<A, B> = <A as Join<B>>::Joined;

// ============================================================================
// Operands
// ============================================================================

/// A value usable as an operand of [`pmap_hood`]
pub trait HoodOperand: Tiered<Value: Payload> {
    type Kind: OperandKind;

    /// The operand as a field, or `None` when it does not exist on this
    /// device
    fn view(&self) -> Option<FieldView<'_, Self::Value>>;
}

macro_rules! impl_local_operand {
    ($($t:ty),* $(,)?) => {
        $(
            impl HoodOperand for $t {
                type Kind = LocalKind;

                fn view(&self) -> Option<FieldView<'_, $t>> {
                    Some(FieldView::constant(self))
                }
            }
        )*
    };
}

impl_local_operand!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, DeviceId,
);

impl<T: Payload> HoodOperand for Local<T> {
    type Kind = LocalKind;

    fn view(&self) -> Option<FieldView<'_, T>> {
        Some(FieldView::constant(&self.0))
    }
}

impl<T: Payload> HoodOperand for Field<T> {
    type Kind = FieldKind;

    fn view(&self) -> Option<FieldView<'_, T>> {
        Some(Field::view(self))
    }
}

impl<const TIER: Tier, T: Payload, S: Placement> HoodOperand for Placed<TIER, T, S> {
    type Kind = PlacedKind<TIER>;

    fn view(&self) -> Option<FieldView<'_, T>> {
        self.try_get().map(Field::view)
    }
}

impl<X: HoodOperand + ?Sized> HoodOperand for &X {
    type Kind = X::Kind;

    fn view(&self) -> Option<FieldView<'_, X::Value>> {
        (**self).view()
    }
}

fn present<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => unreachable!("operand absent where the combined bounds exist"),
    }
}

// ============================================================================
// pmap_hood
// ============================================================================

/// A tuple of operands accepted by [`pmap_hood`] with operator `F`
pub trait HoodArgs<F> {
    type Output;

    fn pmap(self, op: F) -> Self::Output;
}

macro_rules! impl_hood_args {
    (
        ($($operand:ident $var:ident $view:ident),+),
        kind = $kind:ty,
        bounds = $bounds:ty,
        where [$($extra:tt)*]
    ) => {
        impl<F, R, $($operand),+> HoodArgs<F> for ($($operand,)+)
        where
            $($operand: HoodOperand,)+
            F: FnMut($($operand::Value),+) -> R,
            R: Payload,
            $($extra)*
        {
            type Output = <$kind as OperandKind>::Output<R, $bounds>;

            fn pmap(self, mut op: F) -> Self::Output {
                let ($($var,)+) = self;
                <$kind as OperandKind>::assemble::<R, $bounds>(move || {
                    $(let $view = present($var.view());)+
                    let lists = [$($view.ids()),+];
                    let ids = merge_ids(&lists);
                    let default = op($($view.default_value().clone()),+);
                    let values = ids
                        .iter()
                        .map(|&id| op($($view.lookup(id).clone()),+))
                        .collect();
                    Field::from_parts_unchecked(ids, values, default)
                })
            }
        }
    };
}

impl_hood_args!(
    (A a va),
    kind = A::Kind,
    bounds = A::Bounds,
    where []
);

impl_hood_args!(
    (A a va, B b vb),
    kind = JoinOf<A::Kind, B::Kind>,
    bounds = Meet<A::Bounds, B::Bounds>,
    where [A::Kind: Join<B::Kind>,]
);

impl_hood_args!(
    (A a va, B b vb, C c vc),
    kind = JoinOf<JoinOf<A::Kind, B::Kind>, C::Kind>,
    bounds = Meet<Meet<A::Bounds, B::Bounds>, C::Bounds>,
    where [
        A::Kind: Join<B::Kind>,
        JoinOf<A::Kind, B::Kind>: Join<C::Kind>,
    ]
);

impl_hood_args!(
    (A a va, B b vb, C c vc, D d vd),
    kind = JoinOf<JoinOf<JoinOf<A::Kind, B::Kind>, C::Kind>, D::Kind>,
    bounds = Meet<Meet<Meet<A::Bounds, B::Bounds>, C::Bounds>, D::Bounds>,
    where [
        A::Kind: Join<B::Kind>,
        JoinOf<A::Kind, B::Kind>: Join<C::Kind>,
        JoinOf<JoinOf<A::Kind, B::Kind>, C::Kind>: Join<D::Kind>,
    ]
);

/// Apply `op` pointwise to a tuple of operands
///
/// Neighbour ids are the union of the ids of all field operands; an operand
/// without an entry for an id contributes its default. The operator takes
/// its arguments by value, so closures usually need annotated parameters:
///
/// ```
/// use fieldcalc_core::{pmap_hood, Placed, Pq};
///
/// let x: Placed<8, i32> = Placed::new(1);
/// let y: Placed<8, i32, Pq<11, 6>> = Placed::new(2);
/// let r = pmap_hood(|a: i32, b: i32| a + b, (&x, &y));
/// assert_eq!(r.get_or(999), 3);
/// ```
///
/// Placed operands must share one tier:
///
/// ```compile_fail
/// use fieldcalc_core::{pmap_hood, Placed};
///
/// let x: Placed<8, i32> = Placed::new(1);
/// let y: Placed<16, i32> = Placed::new(2);
/// let _ = pmap_hood(|a: i32, b: i32| a + b, (&x, &y));
/// ```
pub fn pmap_hood<F, Args: HoodArgs<F>>(op: F, args: Args) -> Args::Output {
    args.pmap(op)
}

// ============================================================================
// Reductions and selection
// ============================================================================

/// Fold a placed field over `domain` (see [`Field::fold`])
///
/// The result keeps the existence bound and sees no neighbours. `op` runs
/// only when the value exists on this device.
pub fn fold_hood<const TIER: Tier, T: Payload, S: Placement>(
    op: impl FnMut(T, T) -> T,
    field: &Placed<TIER, T, S>,
    domain: &[DeviceId],
) -> Placed<TIER, T, Reduced<S>> {
    Placed::build(|| {
        trace!(tier = TIER, domain = domain.len(), "placed inclusive fold");
        Field::constant(present(field.try_get()).fold(op, domain))
    })
}

/// Fold a placed field over `domain`, with `seed` standing in for the value
/// of `excluded` (see [`Field::fold_except`])
pub fn fold_hood_except<const TIER: Tier, T: Payload, S: Placement>(
    op: impl FnMut(T, T) -> T,
    field: &Placed<TIER, T, S>,
    seed: T,
    domain: &[DeviceId],
    excluded: DeviceId,
) -> Placed<TIER, T, Reduced<S>> {
    Placed::build(|| {
        trace!(tier = TIER, domain = domain.len(), %excluded, "placed exclusive fold");
        Field::constant(present(field.try_get()).fold_except(op, seed, domain, excluded))
    })
}

/// A tuple of placed values of one tier and payload, accepted by [`get_or`]
pub trait FirstPresent {
    type Output;

    fn first_present(self) -> Self::Output;
}

macro_rules! impl_first_present {
    (($($s:ident $p:ident),+), cover = $cover:ty) => {
        impl<const TIER: Tier, T: Payload, $($s: Placement),+> FirstPresent
            for ($(Placed<TIER, T, $s>,)+)
        {
            type Output = Placed<TIER, T, $cover>;

            fn first_present(self) -> Self::Output {
                let ($($p,)+) = self;
                Placed::build(move || {
                    let mut candidates = [$($p.into_field()),+].into_iter().flatten();
                    present(candidates.next())
                })
            }
        }
    };
}

impl_first_present!((S1 a, S2 b), cover = Cover<S1, S2>);
impl_first_present!((S1 a, S2 b, S3 c), cover = Cover<Cover<S1, S2>, S3>);
impl_first_present!(
    (S1 a, S2 b, S3 c, S4 d),
    cover = Cover<Cover<Cover<S1, S2>, S3>, S4>
);

/// The first operand that exists on this device, under the union of all
/// bounds
pub fn get_or<Fs: FirstPresent>(candidates: Fs) -> Fs::Output {
    candidates.first_present()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::{ALL_TIERS, Pq};

    fn bounds_of<const TIER: Tier, T: Payload, S: Placement>(_: &Placed<TIER, T, S>) -> (Tier, Tier) {
        (S::P_MASK, S::Q_MASK)
    }

    #[test]
    fn test_pmap_locals() {
        let r: i32 = pmap_hood(|a: i32, b: i32| a * b, (6_i32, 7_i32));
        assert_eq!(r, 42);
        let r: String = pmap_hood(|a: String| a + "!", ("hi".to_string(),));
        assert_eq!(r, "hi!");
    }

    #[test]
    fn test_pmap_local_and_field() {
        let r: Field<i32> = pmap_hood(|a: i32, b: i32| a + b, (4_i32, Field::constant(8_i32)));
        assert_eq!(r, Field::constant(12));
    }

    #[test]
    fn test_pmap_merges_neighbours() {
        let a = Field::from_sorted(vec![DeviceId(1), DeviceId(3)], vec![10, 30], 0).unwrap();
        let b = Field::from_sorted(vec![DeviceId(2), DeviceId(3)], vec![200, 300], 100).unwrap();
        let r = pmap_hood(|x: i32, y: i32| x + y, (&a, &b));
        assert_eq!(r.ids(), &[DeviceId(1), DeviceId(2), DeviceId(3)]);
        assert_eq!(r.values(), &[110, 200, 330]);
        assert_eq!(*r.self_value(), 100);
    }

    #[test]
    fn test_pmap_placed_bounds() {
        let x: Placed<8, i32> = Placed::new(1);
        let y: Placed<8, i32, Pq<11, 6>> = Placed::new(2);
        let z: Placed<8, i32, Pq<12, 12>> = Placed::new(4);
        let w: Placed<8, i32, Pq<6, 0>> = Placed::absent();

        let r1 = pmap_hood(|a: i32, b: i32| a + b, (&x, &y));
        assert_eq!(bounds_of(&r1), (11, 6));
        assert_eq!(r1.get_or(999), 3);

        let r2 = pmap_hood(|a: i32, b: i32, c: i32| a + b + c, (&x, &y, &z));
        assert_eq!(bounds_of(&r2), (8, 14));
        assert_eq!(r2.get_or(999), 7);

        let r3 = pmap_hood(|a: i32, b: i32, c: i32| a + b + c, (Field::constant(1_i32), 8_i32, &z));
        assert_eq!(bounds_of(&r3), (12, ALL_TIERS));
        assert_eq!(r3.get_or(999), 13);

        let r4 = pmap_hood(|a: i32, b: i32, c: i32| a + b + c, (&x, Field::constant(8_i32), &z));
        assert_eq!(bounds_of(&r4), (12, ALL_TIERS));
        assert_eq!(r4.get_or(999), 13);

        let r6 = pmap_hood(|a: i32, b: i32, c: i32| a + b + c, (&x, Field::constant(8_i32), &w));
        assert_eq!(bounds_of(&r6), (6, ALL_TIERS));
        assert_eq!(r6.get_or(999), 999);
    }

    #[test]
    fn test_pmap_skips_op_when_absent() {
        let x: Placed<8, i32, Pq<4, 0>> = Placed::absent();
        let mut calls = 0;
        let r = pmap_hood(
            |a: i32| {
                calls += 1;
                a
            },
            (&x,),
        );
        assert!(!r.is_present());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_pmap_four_operands() {
        let x: Placed<8, i32, Pq<12, 1>> = Placed::new(1);
        let r = pmap_hood(
            |a: i32, b: i32, c: i64, d: f64| f64::from(a + b) + c as f64 + d,
            (&x, 2_i32, 3_i64, 0.5_f64),
        );
        assert_eq!(bounds_of(&r), (12, 1));
        assert_eq!(r.get_or(0.0), 6.5);
    }

    #[test]
    fn test_fold_hood() {
        let f = Field::from_sorted(DeviceId::range(1, 3), vec![4.0, 6.0, 8.0], 2.0).unwrap();
        let x: Placed<8, f64, Pq<12, 2>> = Placed::from_field(f);

        let r1 = fold_hood(|a, b| a + b, &x, &DeviceId::range(0, 2));
        assert_eq!(bounds_of(&r1), (12, 0));
        assert_eq!(r1.get_or(999.0), 12.0);

        let r2 = fold_hood_except(|a, b| a + b, &x, 5.0, &DeviceId::range(0, 2), DeviceId(2));
        assert_eq!(bounds_of(&r2), (12, 0));
        assert_eq!(r2.get_or(999.0), 11.0);
    }

    #[test]
    fn test_fold_hood_absent_skips_op() {
        let x: Placed<8, f64, Pq<4, 2>> = Placed::absent();
        let r = fold_hood(|_: f64, _: f64| -> f64 { panic!("op must not run") }, &x, &[DeviceId(1)]);
        assert!(!r.is_present());
    }

    #[test]
    fn test_get_or_first_present() {
        let a: Placed<8, i32, Pq<4, 0>> = Placed::absent();
        let b: Placed<8, i32, Pq<8, 2>> = Placed::new(7);
        let r = get_or((a, b));
        assert_eq!(bounds_of(&r), (12, 2));
        assert_eq!(r.get_or(0), 7);

        let a: Placed<8, i32, Pq<8, 0>> = Placed::new(1);
        let b: Placed<8, i32, Pq<12, 0>> = Placed::new(2);
        let c: Placed<8, i32, Pq<16, 1>> = Placed::absent();
        let r = get_or((a, b, c));
        assert_eq!(bounds_of(&r), (28, 1));
        assert_eq!(r.get_or(0), 1);
    }

    #[test]
    fn test_get_or_none_present() {
        let a: Placed<8, i32, Pq<4, 0>> = Placed::absent();
        let b: Placed<8, i32, Pq<2, 0>> = Placed::absent();
        let r = get_or((a, b));
        assert_eq!(bounds_of(&r), (6, 0));
        assert!(!r.is_present());
    }
}
