// src/group/short_weierstrass.rs

use num::{BigInt, Integer, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::group::CyclicGroupElement;
use crate::integer_math::modular::mod_inv;

/// An elliptic curve on short Weierstrass form y^2 = x^3 + ax + b (mod p),
/// for p a prime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShortWeierstrassCurve {
    a: BigInt,
    b: BigInt,
    p: BigInt,
}

impl ShortWeierstrassCurve {
    pub fn new(a: BigInt, b: BigInt, p: BigInt) -> Self {
        let a = a.mod_floor(&p);
        let b = b.mod_floor(&p);
        ShortWeierstrassCurve { a, b, p }
    }

    /// The y coordinate of the representation of the point at infinity: the
    /// pair (0, y) with y = 0 unless (0, 0) lies on the curve, in which case
    /// y = 1.
    fn identity_y(&self) -> BigInt {
        if self.b.is_zero() {
            BigInt::from(1)
        } else {
            BigInt::zero()
        }
    }

    /// True iff (x, y) satisfies the curve equation.
    pub fn contains(&self, x: &BigInt, y: &BigInt) -> bool {
        let lhs = (y * y).mod_floor(&self.p);
        let rhs = (x * x * x + &self.a * x + &self.b).mod_floor(&self.p);
        lhs == rhs
    }
}

/// A point on a short Weierstrass curve over a prime field, exposed
/// multiplicatively: "multiply" is point addition and "pow" is scalar
/// multiplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurvePoint {
    x: BigInt,
    y: BigInt,
    curve: ShortWeierstrassCurve,
}

impl CurvePoint {
    /// Constructs the point (x, y) on the curve. Fails if the pair does not
    /// satisfy the curve equation.
    pub fn new(x: BigInt, y: BigInt, curve: ShortWeierstrassCurve) -> Result<Self> {
        let x = x.mod_floor(&curve.p);
        let y = y.mod_floor(&curve.p);

        if !curve.contains(&x, &y) {
            return Err(Error::domain("the point does not lie on the curve"));
        }

        Ok(CurvePoint { x, y, curve })
    }

    /// The point at infinity on the curve.
    pub fn at_infinity(curve: ShortWeierstrassCurve) -> Self {
        let y = curve.identity_y();
        CurvePoint { x: BigInt::zero(), y, curve }
    }

    pub fn x(&self) -> &BigInt {
        &self.x
    }

    pub fn y(&self) -> &BigInt {
        &self.y
    }

    fn negated(&self) -> Self {
        if self.is_identity() {
            return self.clone();
        }
        CurvePoint {
            x: self.x.clone(),
            y: (-&self.y).mod_floor(&self.curve.p),
            curve: self.curve.clone(),
        }
    }

    /// Point addition by the chord-and-tangent rules.
    fn add_point(&self, other: &Self) -> Self {
        debug_assert_eq!(self.curve, other.curve);

        if self.is_identity() {
            return other.clone();
        }
        if other.is_identity() {
            return self.clone();
        }

        let p = &self.curve.p;

        if self.x == other.x {
            let y_sum = (&self.y + &other.y).mod_floor(p);
            if y_sum.is_zero() {
                // P + (-P) is the point at infinity.
                return CurvePoint::at_infinity(self.curve.clone());
            }

            // Doubling: lambda = (3x^2 + a) / 2y.
            let numerator = (BigInt::from(3) * &self.x * &self.x + &self.curve.a).mod_floor(p);
            let denominator = (BigInt::from(2) * &self.y).mod_floor(p);
            let lambda = (numerator
                * mod_inv(&denominator, p).expect("the tangent slope denominator is invertible"))
            .mod_floor(p);

            let x = (&lambda * &lambda - BigInt::from(2) * &self.x).mod_floor(p);
            let y = (lambda * (&self.x - &x) - &self.y).mod_floor(p);
            return CurvePoint { x, y, curve: self.curve.clone() };
        }

        // Chord: lambda = (y2 - y1) / (x2 - x1).
        let numerator = (&other.y - &self.y).mod_floor(p);
        let denominator = (&other.x - &self.x).mod_floor(p);
        let lambda = (numerator
            * mod_inv(&denominator, p).expect("the chord slope denominator is invertible"))
        .mod_floor(p);

        let x = (&lambda * &lambda - &self.x - &other.x).mod_floor(p);
        let y = (lambda * (&self.x - &x) - &self.y).mod_floor(p);
        CurvePoint { x, y, curve: self.curve.clone() }
    }
}

impl CyclicGroupElement for CurvePoint {
    fn multiply(&self, other: &Self) -> Self {
        self.add_point(other)
    }

    fn pow(&self, e: &BigInt) -> Self {
        let (base, mut e) = if e.is_negative() {
            (self.negated(), -e)
        } else {
            (self.clone(), e.clone())
        };

        // Double-and-add.
        let mut result = CurvePoint::at_infinity(self.curve.clone());
        let mut doubled = base;
        while e.is_positive() {
            if e.is_odd() {
                result = result.add_point(&doubled);
            }
            doubled = doubled.add_point(&doubled);
            e >>= 1;
        }

        result
    }

    fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y == self.curve.identity_y()
    }
}
