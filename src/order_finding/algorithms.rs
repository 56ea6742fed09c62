// src/order_finding/algorithms.rs

use num::{BigInt, One};

use crate::core::error::Result;
use crate::core::timeout::Timeout;
use crate::group::CyclicGroupElement;
use crate::integer_math::primes::{largest_power_exponent, prime_range};

/// True iff r_tilde is an integer on [1, 2^m).
pub fn is_valid_r_tilde(r_tilde: &BigInt, m: u32) -> bool {
    r_tilde >= &BigInt::one() && r_tilde < &(BigInt::one() << m as usize)
}

/// Recovers a multiple of the order r of g, assuming r = d * r_tilde for d
/// cm-smooth: returns r_tilde * P for P the cm-smooth prime power product,
/// as soon as the accumulated exponent drives g to the identity.
///
/// Returns None when the smoothness assumption fails.
pub fn recover_multiple_of_r<G: CyclicGroupElement>(
    g: &G,
    r_tilde: &BigInt,
    m: u32,
    c: u64,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    if !is_valid_r_tilde(r_tilde, m) {
        return Ok(None);
    }

    let cm = c * m as u64;

    let mut rp = r_tilde.clone();
    let mut x = g.pow(r_tilde);

    for q in prime_range(cm + 1) {
        timeout.check()?;

        if x.is_identity() {
            return Ok(Some(rp));
        }

        let e = largest_power_exponent(q, cm);
        let q_pow_e = BigInt::from(q.pow(e));
        x = x.pow(&q_pow_e);
        rp *= q_pow_e;
    }

    if !x.is_identity() {
        return Ok(None);
    }

    Ok(Some(rp))
}

/// Recovers the order r of g, assuming r = d * r_tilde for d cm-smooth, by
/// speculative exponent shaving: raise g^r_tilde through the full prime power
/// schedule, then strip the superfluous prime factors back out.
///
/// Faster than `recover_order_binary` on average, but slower in the worst
/// case. Returns None when the smoothness assumption fails.
pub fn recover_order_speculative<G: CyclicGroupElement>(
    g: &G,
    r_tilde: &BigInt,
    m: u32,
    c: u64,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    if !is_valid_r_tilde(r_tilde, m) {
        return Ok(None);
    }

    let cm = c * m as u64;

    let mut x = g.pow(r_tilde);
    if x.is_identity() {
        return Ok(Some(r_tilde.clone()));
    }

    // Climb: remember the element before each prime power is applied.
    let mut stack: Vec<(G, u64, u32)> = Vec::new();

    for q in prime_range(cm + 1) {
        timeout.check()?;

        let e = largest_power_exponent(q, cm);
        stack.push((x.clone(), q, e));

        let q_pow_e = BigInt::from(q.pow(e));
        x = x.pow(&q_pow_e);

        if x.is_identity() {
            break;
        }
    }

    if !x.is_identity() {
        return Ok(None);
    }

    // Descend: accumulate the minimal d with g^(d * r_tilde) = 1.
    let mut d = BigInt::one();

    while let Some((saved, q, e)) = stack.pop() {
        timeout.check()?;

        let mut x = saved.pow(&d);
        let q = BigInt::from(q);

        for _ in 1..=e {
            if x.is_identity() {
                break;
            }
            x = x.pow(&q);
            d *= &q;
        }
    }

    Ok(Some(d * r_tilde))
}

/// Recovers the order r of g, assuming r = d * r_tilde for d cm-smooth, by
/// recursively splitting the prime schedule so that each prime receives the
/// element already raised to every other prime power.
///
/// Computes the same result as `recover_order_speculative` with a better
/// worst-case operation count. Returns None when the smoothness assumption
/// fails.
pub fn recover_order_binary<G: CyclicGroupElement>(
    g: &G,
    r_tilde: &BigInt,
    m: u32,
    c: u64,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    if !is_valid_r_tilde(r_tilde, m) {
        return Ok(None);
    }

    let cm = c * m as u64;

    fn power_product(primes: &[u64], cm: u64) -> BigInt {
        primes
            .iter()
            .map(|&q| BigInt::from(q.pow(largest_power_exponent(q, cm))))
            .product()
    }

    fn split<G: CyclicGroupElement>(
        x: &G,
        primes: &[u64],
        cm: u64,
        timeout: &Timeout,
        out: &mut Vec<(u64, G)>,
    ) -> Result<()> {
        timeout.check()?;

        if primes.len() == 1 {
            out.push((primes[0], x.clone()));
            return Ok(());
        }

        let (left, right) = primes.split_at(primes.len() / 2);

        // Raise to the complementary side's full prime power product.
        let x_left = x.pow(&power_product(right, cm));
        let x_right = x.pow(&power_product(left, cm));

        split(&x_left, left, cm, timeout, out)?;
        split(&x_right, right, cm, timeout, out)
    }

    let x = g.pow(r_tilde);
    let primes = prime_range(cm + 1);
    if primes.is_empty() {
        return Ok(if x.is_identity() { Some(r_tilde.clone()) } else { None });
    }

    let mut residues: Vec<(u64, G)> = Vec::new();
    split(&x, &primes, cm, timeout, &mut residues)?;

    let mut d = BigInt::one();

    for (q, mut x_i) in residues {
        timeout.check()?;

        let e_max = largest_power_exponent(q, cm);
        let mut e = 0;
        let q = BigInt::from(q);

        while !x_i.is_identity() {
            if e == e_max {
                return Ok(None);
            }
            x_i = x_i.pow(&q);
            d *= &q;
            e += 1;
        }
    }

    Ok(Some(d * r_tilde))
}

/// Filters a set of candidates for r_tilde down to those for which
/// `recover_multiple_of_r` would succeed, sharing one exponentiation
/// schedule: x = g^P is computed once and each candidate costs a single
/// power x^r_tilde.
pub fn filter_r_tilde_candidates<G: CyclicGroupElement>(
    g: &G,
    candidates: &[BigInt],
    m: u32,
    c: u64,
    timeout: &Timeout,
) -> Result<Vec<BigInt>> {
    let cm = c * m as u64;
    let e = crate::integer_math::primes::prime_power_product(cm);
    let x = g.pow(&e);

    let mut surviving = Vec::new();

    for r_tilde in candidates {
        timeout.check()?;

        if is_valid_r_tilde(r_tilde, m) && x.pow(r_tilde).is_identity() {
            surviving.push(r_tilde.clone());
        }
    }

    Ok(surviving)
}
