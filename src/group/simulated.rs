// src/group/simulated.rs

use num::{BigInt, Integer, One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::group::CyclicGroupElement;

/// The simulated group element G^d, for G a generator of a cyclic group of
/// known order r.
///
/// Arithmetic reduces to index arithmetic modulo r, which makes this element
/// cheap enough to drive tests with orders of any size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulatedGroupElement {
    order: BigInt,
    index: BigInt,
}

impl SimulatedGroupElement {
    /// Constructs G^index in the simulated group of the given order.
    pub fn new(order: BigInt, index: BigInt) -> Result<Self> {
        if !order.is_positive() {
            return Err(Error::domain("the simulated group order must be positive"));
        }
        let index = index.mod_floor(&order);
        Ok(SimulatedGroupElement { order, index })
    }

    /// The generator G of the simulated group of the given order.
    pub fn generator(order: BigInt) -> Result<Self> {
        Self::new(order, BigInt::one())
    }

    pub fn order(&self) -> &BigInt {
        &self.order
    }

    pub fn index(&self) -> &BigInt {
        &self.index
    }
}

impl CyclicGroupElement for SimulatedGroupElement {
    fn multiply(&self, other: &Self) -> Self {
        debug_assert_eq!(self.order, other.order);
        SimulatedGroupElement {
            order: self.order.clone(),
            index: (&self.index + &other.index).mod_floor(&self.order),
        }
    }

    fn pow(&self, e: &BigInt) -> Self {
        SimulatedGroupElement {
            order: self.order.clone(),
            index: (&self.index * e).mod_floor(&self.order),
        }
    }

    fn is_identity(&self) -> bool {
        self.index.is_zero()
    }
}
