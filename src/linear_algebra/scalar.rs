// src/linear_algebra/scalar.rs

use std::fmt;

use num::bigint::Sign;
use num::{BigInt, BigRational, One, Signed, Zero};
use rug::float::Round;
use rug::ops::DivAssignRound;

/// The scalar type of Gram–Schmidt projection factors.
///
/// Two instances exist: exact `BigRational` quotients, and `Fp`, a
/// fixed-precision binary float. Reduction, nearest-plane and enumeration
/// code is generic over this seam; the context carries the precision for the
/// float instance and is `()` for the exact one.
pub trait Scalar: Clone + PartialEq + PartialOrd + fmt::Debug {
    type Ctx: Copy + fmt::Debug;

    fn zero(ctx: Self::Ctx) -> Self;
    fn from_f64(value: f64, ctx: Self::Ctx) -> Self;
    fn from_int(value: &BigInt, ctx: Self::Ctx) -> Self;
    /// The quotient num / den, with den non-zero.
    fn from_ratio(num: &BigInt, den: &BigInt, ctx: Self::Ctx) -> Self;
    fn from_rational(value: &BigRational, ctx: Self::Ctx) -> Self;

    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    /// The quotient self / other, with other non-zero.
    fn div(&self, other: &Self) -> Self;
    fn mul_int(&self, value: &BigInt) -> Self;

    fn abs(&self) -> Self;
    fn is_zero(&self) -> bool;
    fn is_negative(&self) -> bool;
    /// Nearest integer, ties away from zero.
    fn round(&self) -> BigInt;
    /// True iff |self| > 1/2.
    fn exceeds_half(&self) -> bool;
}

impl Scalar for BigRational {
    type Ctx = ();

    fn zero(_ctx: ()) -> Self {
        <BigRational as Zero>::zero()
    }

    fn from_f64(value: f64, _ctx: ()) -> Self {
        BigRational::from_float(value).unwrap_or_else(<BigRational as Zero>::zero)
    }

    fn from_int(value: &BigInt, _ctx: ()) -> Self {
        BigRational::from_integer(value.clone())
    }

    fn from_ratio(num: &BigInt, den: &BigInt, _ctx: ()) -> Self {
        BigRational::new(num.clone(), den.clone())
    }

    fn from_rational(value: &BigRational, _ctx: ()) -> Self {
        value.clone()
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn mul(&self, other: &Self) -> Self {
        self * other
    }

    fn div(&self, other: &Self) -> Self {
        self / other
    }

    fn mul_int(&self, value: &BigInt) -> Self {
        self * BigRational::from_integer(value.clone())
    }

    fn abs(&self) -> Self {
        Signed::abs(self)
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn is_negative(&self) -> bool {
        Signed::is_negative(self)
    }

    fn round(&self) -> BigInt {
        BigRational::round(self).to_integer()
    }

    fn exceeds_half(&self) -> bool {
        Signed::abs(self) * BigInt::from(2) > BigRational::one()
    }
}

/// A fixed-precision binary floating point value (MPFR semantics).
#[derive(Clone, Debug)]
pub struct Fp(rug::Float);

impl Fp {
    pub fn precision(&self) -> u32 {
        self.0.prec()
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64()
    }
}

impl PartialEq for Fp {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Fp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Scalar for Fp {
    type Ctx = u32;

    fn zero(prec: u32) -> Self {
        Fp(rug::Float::with_val(prec, 0))
    }

    fn from_f64(value: f64, prec: u32) -> Self {
        Fp(rug::Float::with_val(prec, value))
    }

    fn from_int(value: &BigInt, prec: u32) -> Self {
        Fp(rug::Float::with_val(prec, bigint_to_rug(value)))
    }

    fn from_ratio(num: &BigInt, den: &BigInt, prec: u32) -> Self {
        let mut quotient = rug::Float::with_val(prec, bigint_to_rug(num));
        quotient.div_assign_round(rug::Float::with_val(prec, bigint_to_rug(den)), Round::Nearest);
        Fp(quotient)
    }

    fn from_rational(value: &BigRational, prec: u32) -> Self {
        Self::from_ratio(value.numer(), value.denom(), prec)
    }

    fn add(&self, other: &Self) -> Self {
        Fp(rug::Float::with_val(self.0.prec(), &self.0 + &other.0))
    }

    fn sub(&self, other: &Self) -> Self {
        Fp(rug::Float::with_val(self.0.prec(), &self.0 - &other.0))
    }

    fn mul(&self, other: &Self) -> Self {
        Fp(rug::Float::with_val(self.0.prec(), &self.0 * &other.0))
    }

    fn div(&self, other: &Self) -> Self {
        Fp(rug::Float::with_val(self.0.prec(), &self.0 / &other.0))
    }

    fn mul_int(&self, value: &BigInt) -> Self {
        let factor = bigint_to_rug(value);
        Fp(rug::Float::with_val(self.0.prec(), &self.0 * &factor))
    }

    fn abs(&self) -> Self {
        Fp(rug::Float::with_val(self.0.prec(), self.0.abs_ref()))
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    fn round(&self) -> BigInt {
        let rounded = rug::Float::with_val(self.0.prec(), self.0.round_ref());
        rug_to_bigint(&rounded.to_integer().unwrap_or_else(rug::Integer::new))
    }

    fn exceeds_half(&self) -> bool {
        let doubled = rug::Float::with_val(self.0.prec(), self.0.abs_ref()) * 2u32;
        doubled > 1u32
    }
}

/// Converts a `num::BigInt` to a `rug::Integer` through its little-endian
/// magnitude bytes.
pub fn bigint_to_rug(value: &BigInt) -> rug::Integer {
    let (sign, bytes) = value.to_bytes_le();
    let magnitude = rug::Integer::from_digits(&bytes, rug::integer::Order::Lsf);
    match sign {
        Sign::Minus => -magnitude,
        _ => magnitude,
    }
}

/// Converts a `rug::Integer` back to a `num::BigInt`.
pub fn rug_to_bigint(value: &rug::Integer) -> BigInt {
    let bytes: Vec<u8> = value.to_digits(rug::integer::Order::Lsf);
    let sign = match value.cmp0() {
        std::cmp::Ordering::Less => Sign::Minus,
        std::cmp::Ordering::Equal => Sign::NoSign,
        std::cmp::Ordering::Greater => Sign::Plus,
    };
    BigInt::from_bytes_le(sign, &bytes)
}
