//! # Fieldcalc Core
//!
//! Core types and operators of a field-calculus runtime for tiered
//! deployments.
//!
//! Every device has an atomic tier (a single bit). Programs are compiled once
//! per tier, and every value carries placement bounds `(p, q)` saying on which
//! tiers it exists and from which tiers its neighbour values are visible. All
//! existence decisions are made by the compiler, so values that cannot exist
//! on a device cost nothing in memory, computation or bandwidth.
//!
//! ## Key Traits
//!
//! - [`Placement`]: Type-level placement bounds and their combinators
//! - [`Presence`]: Storage mode of an [`Opt`] (never, always, runtime, gated)
//! - [`Tiered`]: Tier inference over heterogeneous operand shapes
//! - [`HoodOperand`]: Operands accepted by [`pmap_hood`]
//! - [`TierVisitor`]: Code run once the device tier is known
//!
//! ## Key Types
//!
//! - [`Opt`]: Optional storage with compile-time or runtime presence
//! - [`Field`]: Neighbouring values with a default
//! - [`Placed`]: A field with placement bounds on a given tier
//! - [`Neighborhood`]: Factory turning received neighbour data into fields
//! - [`TierConfig`]: How the tier of a device is determined
//!
//! Pointwise arithmetic on placed values is provided by the standard operator
//! traits and by the named functions in [`ops`].

pub mod device;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod hood;
pub mod neighborhood;
pub mod ops;
pub mod opt;
pub mod placed;
pub mod shape;
pub mod tier;
pub mod wire;

// Re-export main types
pub use device::*;
pub use dispatch::*;
pub use error::*;
pub use field::*;
pub use hood::*;
pub use neighborhood::*;
pub use opt::*;
pub use placed::*;
pub use shape::*;
pub use tier::*;
