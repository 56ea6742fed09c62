// src/group/mod.rs

pub mod integer_mod_ring;
pub mod short_weierstrass;
pub mod simulated;

use std::fmt::Debug;
use std::hash::Hash;

use num::BigInt;

pub use integer_mod_ring::IntegerModRingElement;
pub use short_weierstrass::{CurvePoint, ShortWeierstrassCurve};
pub use simulated::SimulatedGroupElement;

/// An element of a finite cyclic group, written multiplicatively.
///
/// The core never constructs elements on its own: it multiplies, raises to
/// integer powers (negative exponents go through the group inverse), tests
/// against the identity, and hashes. Equality and hashing are meaningful
/// within a single group only; the caller keeps groups from mixing.
pub trait CyclicGroupElement: Clone + PartialEq + Eq + Hash + Debug {
    /// The group product g * other.
    fn multiply(&self, other: &Self) -> Self;

    /// The power g^e, for any integer e.
    fn pow(&self, e: &BigInt) -> Self;

    /// True iff this element is the identity of its group.
    fn is_identity(&self) -> bool;

    /// The identity element of this element's group.
    fn identity(&self) -> Self {
        self.pow(&BigInt::from(0))
    }

    /// The group inverse g^-1.
    fn inverse(&self) -> Self {
        self.pow(&BigInt::from(-1))
    }
}
