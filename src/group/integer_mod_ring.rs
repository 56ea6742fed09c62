// src/group/integer_mod_ring.rs

use num::{BigInt, Integer, One, Signed};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::group::CyclicGroupElement;
use crate::integer_math::modular::mod_inv;

/// The element g of the multiplicative group of the ring of integers
/// modulo N.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegerModRingElement {
    value: BigInt,
    modulus: BigInt,
}

impl IntegerModRingElement {
    /// Constructs g in Z_N^*. Requires 1 <= g < N and gcd(g, N) = 1.
    pub fn new(value: BigInt, modulus: BigInt) -> Result<Self> {
        if value < BigInt::one() || value >= modulus {
            return Err(Error::domain("the element must lie on [1, N)"));
        }
        if !value.gcd(&modulus).is_one() {
            return Err(Error::domain("the element must be coprime to the modulus"));
        }

        Ok(IntegerModRingElement { value, modulus })
    }

    pub fn value(&self) -> &BigInt {
        &self.value
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }
}

impl CyclicGroupElement for IntegerModRingElement {
    fn multiply(&self, other: &Self) -> Self {
        debug_assert_eq!(self.modulus, other.modulus);
        IntegerModRingElement {
            value: (&self.value * &other.value).mod_floor(&self.modulus),
            modulus: self.modulus.clone(),
        }
    }

    fn pow(&self, e: &BigInt) -> Self {
        let value = if e.is_negative() {
            // g^e = (g^-1)^(-e) through the modular inverse.
            let inverse = mod_inv(&self.value, &self.modulus)
                .expect("the element is coprime to the modulus by construction");
            inverse.modpow(&-e, &self.modulus)
        } else {
            self.value.modpow(e, &self.modulus)
        };

        IntegerModRingElement { value, modulus: self.modulus.clone() }
    }

    fn is_identity(&self) -> bool {
        self.value.is_one()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(g: i64, n: i64) -> IntegerModRingElement {
        IntegerModRingElement::new(BigInt::from(g), BigInt::from(n)).unwrap()
    }

    #[test]
    fn test_construction_contract() {
        assert!(IntegerModRingElement::new(BigInt::from(0), BigInt::from(15)).is_err());
        assert!(IntegerModRingElement::new(BigInt::from(15), BigInt::from(15)).is_err());
        assert!(IntegerModRingElement::new(BigInt::from(5), BigInt::from(15)).is_err());
        assert!(IntegerModRingElement::new(BigInt::from(2), BigInt::from(15)).is_ok());
    }

    #[test]
    fn test_order_of_two_mod_fifteen() {
        // 2 has order 4 in Z_15^*.
        let g = element(2, 15);
        assert!(!g.pow(&BigInt::from(2)).is_identity());
        assert!(g.pow(&BigInt::from(4)).is_identity());
        assert!(g.pow(&BigInt::from(8)).is_identity());
    }

    #[test]
    fn test_negative_exponent() {
        let g = element(2, 15);
        assert!(g.multiply(&g.inverse()).is_identity());
        assert_eq!(g.pow(&BigInt::from(-3)), g.pow(&BigInt::from(1)));
    }

    #[test]
    fn test_multiplication_matches_powers() {
        let g = element(7, 143);
        let a = g.pow(&BigInt::from(12));
        let b = g.pow(&BigInt::from(30));
        assert_eq!(a.multiply(&b), g.pow(&BigInt::from(42)));
    }
}
