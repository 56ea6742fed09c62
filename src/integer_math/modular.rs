// src/integer_math/modular.rs

use num::{BigInt, Integer, One, Signed, Zero};

use crate::core::error::{Error, Result};

/// Returns x mod N constrained to the interval [-ceil(N/2), ceil(N/2)).
///
/// Fails only if N <= 0.
pub fn truncmod(x: &BigInt, n: &BigInt) -> Result<BigInt> {
    if !n.is_positive() {
        return Err(Error::domain("truncmod requires a positive modulus"));
    }

    let mut x = x.mod_floor(n);
    if &x * 2 >= *n {
        x -= n;
    }

    Ok(x)
}

/// Returns the largest t such that 2^t divides x, for x non-zero.
pub fn kappa(x: &BigInt) -> u64 {
    if x.is_zero() {
        return 0;
    }

    x.trailing_zeros().unwrap_or(0)
}

/// Returns the inverse of x modulo n, or None if gcd(x, n) != 1.
pub fn mod_inv(x: &BigInt, n: &BigInt) -> Option<BigInt> {
    let extended = x.extended_gcd(n);
    if !extended.gcd.is_one() {
        return None;
    }

    Some(extended.x.mod_floor(n))
}
