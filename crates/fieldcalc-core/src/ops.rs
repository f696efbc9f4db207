//! Pointwise operators
//!
//! Named functions cover every arithmetic, bitwise, comparison and logical
//! operator and accept any operand combination supported by
//! [`pmap_hood`]. Arithmetic and bitwise operators are also available
//! through the `std::ops` traits when the left operand is a [`Field`] or a
//! [`Placed`] (owned or borrowed), or a primitive number against one of them.
//!
//! Payloads are combined with the payload type's own operator impls, so
//! mixing `i32` and `f64` needs an explicit conversion first.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use crate::field::{Field, Payload};
use crate::hood::{HoodArgs, HoodOperand, pmap_hood};
use crate::placed::Placed;
use crate::shape::Tiered;
use crate::tier::{Placement, Tier};

/// Operator type used for binary pointwise functions
pub type BinOp<A, B, R> = fn(<A as Tiered>::Value, <B as Tiered>::Value) -> R;

/// Operator type used for unary pointwise functions
pub type UnOp<A, R> = fn(<A as Tiered>::Value) -> R;

/// Result of a binary pointwise function
pub type BinResult<A, B, R> = <(A, B) as HoodArgs<BinOp<A, B, R>>>::Output;

/// Result of a unary pointwise function
pub type UnResult<A, R> = <(A,) as HoodArgs<UnOp<A, R>>>::Output;

macro_rules! binary_fn {
    ($(#[$doc:meta])* $name:ident, $Trait:ident, $method:ident) => {
        $(#[$doc])*
        pub fn $name<A, B>(a: A, b: B) -> BinResult<A, B, <A::Value as $Trait<B::Value>>::Output>
        where
            A: HoodOperand,
            B: HoodOperand,
            A::Value: $Trait<B::Value>,
            (A, B): HoodArgs<BinOp<A, B, <A::Value as $Trait<B::Value>>::Output>>,
        {
            let op: BinOp<A, B, <A::Value as $Trait<B::Value>>::Output> = |x, y| x.$method(y);
            pmap_hood(op, (a, b))
        }
    };
}

binary_fn!(/// Pointwise `a + b`
    add, Add, add);
binary_fn!(/// Pointwise `a - b`
    sub, Sub, sub);
binary_fn!(/// Pointwise `a * b`
    mul, Mul, mul);
binary_fn!(/// Pointwise `a / b`
    div, Div, div);
binary_fn!(/// Pointwise `a % b`
    rem, Rem, rem);
binary_fn!(/// Pointwise `a & b`
    bitand, BitAnd, bitand);
binary_fn!(/// Pointwise `a | b`
    bitor, BitOr, bitor);
binary_fn!(/// Pointwise `a ^ b`
    bitxor, BitXor, bitxor);

/// Pointwise `-a`
pub fn neg<A>(a: A) -> UnResult<A, <A::Value as Neg>::Output>
where
    A: HoodOperand,
    A::Value: Neg,
    (A,): HoodArgs<UnOp<A, <A::Value as Neg>::Output>>,
{
    let op: UnOp<A, <A::Value as Neg>::Output> = |x| -x;
    pmap_hood(op, (a,))
}

/// Pointwise `!a`
pub fn not<A>(a: A) -> UnResult<A, <A::Value as Not>::Output>
where
    A: HoodOperand,
    A::Value: Not,
    (A,): HoodArgs<UnOp<A, <A::Value as Not>::Output>>,
{
    let op: UnOp<A, <A::Value as Not>::Output> = |x| !x;
    pmap_hood(op, (a,))
}

macro_rules! compare_fn {
    ($(#[$doc:meta])* $name:ident, $Trait:ident, $op:tt) => {
        $(#[$doc])*
        pub fn $name<A, B>(a: A, b: B) -> BinResult<A, B, bool>
        where
            A: HoodOperand,
            B: HoodOperand,
            A::Value: $Trait<B::Value>,
            (A, B): HoodArgs<BinOp<A, B, bool>>,
        {
            let op: BinOp<A, B, bool> = |x, y| x $op y;
            pmap_hood(op, (a, b))
        }
    };
}

compare_fn!(/// Pointwise `a < b`
    lt, PartialOrd, <);
compare_fn!(/// Pointwise `a <= b`
    le, PartialOrd, <=);
compare_fn!(/// Pointwise `a > b`
    gt, PartialOrd, >);
compare_fn!(/// Pointwise `a >= b`
    ge, PartialOrd, >=);
compare_fn!(/// Pointwise `a == b`
    eq, PartialEq, ==);
compare_fn!(/// Pointwise `a != b`
    ne, PartialEq, !=);

/// Pointwise `a && b`
pub fn and<A, B>(a: A, b: B) -> BinResult<A, B, bool>
where
    A: HoodOperand<Value = bool>,
    B: HoodOperand<Value = bool>,
    (A, B): HoodArgs<BinOp<A, B, bool>>,
{
    let op: BinOp<A, B, bool> = |x, y| x && y;
    pmap_hood(op, (a, b))
}

/// Pointwise `a || b`
pub fn or<A, B>(a: A, b: B) -> BinResult<A, B, bool>
where
    A: HoodOperand<Value = bool>,
    B: HoodOperand<Value = bool>,
    (A, B): HoodArgs<BinOp<A, B, bool>>,
{
    let op: BinOp<A, B, bool> = |x, y| x || y;
    pmap_hood(op, (a, b))
}

// ============================================================================
// std::ops sugar
// ============================================================================

macro_rules! impl_binary_operator {
    ($Trait:ident, $method:ident, $func:ident) => {
        impl<const TIER: Tier, T: Payload, S: Placement, Rhs> $Trait<Rhs> for Placed<TIER, T, S>
        where
            Rhs: HoodOperand,
            T: $Trait<Rhs::Value>,
            (Self, Rhs): HoodArgs<BinOp<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>>,
        {
            type Output = BinResult<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>;

            fn $method(self, rhs: Rhs) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl<'a, const TIER: Tier, T: Payload, S: Placement, Rhs> $Trait<Rhs>
            for &'a Placed<TIER, T, S>
        where
            Rhs: HoodOperand,
            T: $Trait<Rhs::Value>,
            (Self, Rhs): HoodArgs<BinOp<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>>,
        {
            type Output = BinResult<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>;

            fn $method(self, rhs: Rhs) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl<T: Payload, Rhs> $Trait<Rhs> for Field<T>
        where
            Rhs: HoodOperand,
            T: $Trait<Rhs::Value>,
            (Self, Rhs): HoodArgs<BinOp<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>>,
        {
            type Output = BinResult<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>;

            fn $method(self, rhs: Rhs) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl<'a, T: Payload, Rhs> $Trait<Rhs> for &'a Field<T>
        where
            Rhs: HoodOperand,
            T: $Trait<Rhs::Value>,
            (Self, Rhs): HoodArgs<BinOp<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>>,
        {
            type Output = BinResult<Self, Rhs, <T as $Trait<Rhs::Value>>::Output>;

            fn $method(self, rhs: Rhs) -> Self::Output {
                $func(self, rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, add);
impl_binary_operator!(Sub, sub, sub);
impl_binary_operator!(Mul, mul, mul);
impl_binary_operator!(Div, div, div);
impl_binary_operator!(Rem, rem, rem);
impl_binary_operator!(BitAnd, bitand, bitand);
impl_binary_operator!(BitOr, bitor, bitor);
impl_binary_operator!(BitXor, bitxor, bitxor);

macro_rules! impl_unary_operator {
    ($Trait:ident, $method:ident, $func:ident) => {
        impl<const TIER: Tier, T: Payload, S: Placement> $Trait for Placed<TIER, T, S>
        where
            T: $Trait,
            (Self,): HoodArgs<UnOp<Self, <T as $Trait>::Output>>,
        {
            type Output = UnResult<Self, <T as $Trait>::Output>;

            fn $method(self) -> Self::Output {
                $func(self)
            }
        }

        impl<'a, const TIER: Tier, T: Payload, S: Placement> $Trait for &'a Placed<TIER, T, S>
        where
            T: $Trait,
            (Self,): HoodArgs<UnOp<Self, <T as $Trait>::Output>>,
        {
            type Output = UnResult<Self, <T as $Trait>::Output>;

            fn $method(self) -> Self::Output {
                $func(self)
            }
        }

        impl<T: Payload> $Trait for Field<T>
        where
            T: $Trait,
            (Self,): HoodArgs<UnOp<Self, <T as $Trait>::Output>>,
        {
            type Output = UnResult<Self, <T as $Trait>::Output>;

            fn $method(self) -> Self::Output {
                $func(self)
            }
        }

        impl<'a, T: Payload> $Trait for &'a Field<T>
        where
            T: $Trait,
            (Self,): HoodArgs<UnOp<Self, <T as $Trait>::Output>>,
        {
            type Output = UnResult<Self, <T as $Trait>::Output>;

            fn $method(self) -> Self::Output {
                $func(self)
            }
        }
    };
}

impl_unary_operator!(Neg, neg, neg);
impl_unary_operator!(Not, not, not);

// Primitive left operands against fields and placed values.
macro_rules! impl_scalar_lhs_op {
    ($t:ty, $Trait:ident, $method:ident, $func:ident) => {
        impl<const TIER: Tier, T: Payload, S: Placement> $Trait<Placed<TIER, T, S>> for $t
        where
            $t: $Trait<T>,
            ($t, Placed<TIER, T, S>):
                HoodArgs<BinOp<$t, Placed<TIER, T, S>, <$t as $Trait<T>>::Output>>,
        {
            type Output = BinResult<$t, Placed<TIER, T, S>, <$t as $Trait<T>>::Output>;

            fn $method(self, rhs: Placed<TIER, T, S>) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl<'a, const TIER: Tier, T: Payload, S: Placement> $Trait<&'a Placed<TIER, T, S>> for $t
        where
            $t: $Trait<T>,
            ($t, &'a Placed<TIER, T, S>):
                HoodArgs<BinOp<$t, &'a Placed<TIER, T, S>, <$t as $Trait<T>>::Output>>,
        {
            type Output = BinResult<$t, &'a Placed<TIER, T, S>, <$t as $Trait<T>>::Output>;

            fn $method(self, rhs: &'a Placed<TIER, T, S>) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl<T: Payload> $Trait<Field<T>> for $t
        where
            $t: $Trait<T>,
            ($t, Field<T>): HoodArgs<BinOp<$t, Field<T>, <$t as $Trait<T>>::Output>>,
        {
            type Output = BinResult<$t, Field<T>, <$t as $Trait<T>>::Output>;

            fn $method(self, rhs: Field<T>) -> Self::Output {
                $func(self, rhs)
            }
        }

        impl<'a, T: Payload> $Trait<&'a Field<T>> for $t
        where
            $t: $Trait<T>,
            ($t, &'a Field<T>): HoodArgs<BinOp<$t, &'a Field<T>, <$t as $Trait<T>>::Output>>,
        {
            type Output = BinResult<$t, &'a Field<T>, <$t as $Trait<T>>::Output>;

            fn $method(self, rhs: &'a Field<T>) -> Self::Output {
                $func(self, rhs)
            }
        }
    };
}

macro_rules! impl_scalar_lhs {
    ($($t:ty),* $(,)?) => {
        $(
            impl_scalar_lhs_op!($t, Add, add, add);
            impl_scalar_lhs_op!($t, Sub, sub, sub);
            impl_scalar_lhs_op!($t, Mul, mul, mul);
            impl_scalar_lhs_op!($t, Div, div, div);
            impl_scalar_lhs_op!($t, Rem, rem, rem);
            impl_scalar_lhs_op!($t, BitAnd, bitand, bitand);
            impl_scalar_lhs_op!($t, BitOr, bitor, bitor);
            impl_scalar_lhs_op!($t, BitXor, bitxor, bitxor);
        )*
    };
}

impl_scalar_lhs!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
