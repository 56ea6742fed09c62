// src/factoring/rsa.rs

use num::integer::Roots;
use num::{BigInt, Integer, One, Signed};

use crate::core::error::{Error, Result};

/// Splits N = pq into its two l-bit prime factors given the short logarithm
/// d = (p - 1) / 2 + (q - 1) / 2 - 2^(l - 1), as computed by the
/// Ekerå–Håstad algorithm for RSA moduli.
///
/// From d the sum p + q = 2d + 2^l + 2 follows, and with pq = N the factors
/// solve a quadratic. Returns None when the quadratic has no integer
/// solution, i.e. when d is not of the stated form for N.
pub fn split_n_given_d(d: &BigInt, n: &BigInt) -> Result<Option<(BigInt, BigInt)>> {
    if n.is_even() {
        return Err(Error::domain("N must be odd"));
    }
    if !d.is_positive() || d * 2 >= *n {
        return Err(Error::domain("d must lie on [1, N/2)"));
    }

    // For N = pq with p, q of l bits each, l = ceil(bits(N) / 2).
    let l = (n.bits() + 1) / 2;

    let p_plus_q: BigInt = d * 2 + (BigInt::one() << l as usize) + 2;

    let discriminant: BigInt = &p_plus_q * &p_plus_q - n * 4;
    if !discriminant.is_positive() || p_plus_q.is_odd() {
        return Ok(None);
    }

    let root = discriminant.sqrt();
    if &root * &root != discriminant || root.is_odd() {
        return Ok(None);
    }

    let p = (&p_plus_q - &root) / 2;
    let q = (&p_plus_q + &root) / 2;

    if p > BigInt::one() && q > BigInt::one() && &p * &q == *n {
        Ok(Some((p, q)))
    } else {
        Ok(None)
    }
}
