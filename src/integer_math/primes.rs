// src/integer_math/primes.rs

use num::{BigInt, Integer, One, Signed, Zero};

use crate::core::error::{Error, Result};

/// Returns the ordered list of all primes less than bound.
pub fn prime_range(bound: u64) -> Vec<u64> {
    if bound < 3 {
        return Vec::new();
    }

    let mut sieve = vec![true; bound as usize];
    let mut primes = Vec::new();

    for p in 2..bound {
        if !sieve[p as usize] {
            continue;
        }
        primes.push(p);

        let mut multiple = p * p;
        while multiple < bound {
            sieve[multiple as usize] = false;
            multiple += p;
        }
    }

    primes
}

/// Returns the product of q^e, as q runs over all primes <= bound, for e the
/// largest exponent such that q^e <= bound.
pub fn prime_power_product(bound: u64) -> BigInt {
    let mut product = BigInt::one();

    for q in prime_range(bound + 1) {
        let mut q_pow_e = q;
        while let Some(next) = q_pow_e.checked_mul(q) {
            if next > bound {
                break;
            }
            q_pow_e = next;
        }
        product *= BigInt::from(q_pow_e);
    }

    product
}

/// Largest e such that q^e <= bound, for q >= 2.
pub fn largest_power_exponent(q: u64, bound: u64) -> u32 {
    let mut e = 0;
    let mut q_pow = 1u64;
    while let Some(next) = q_pow.checked_mul(q) {
        if next > bound {
            break;
        }
        q_pow = next;
        e += 1;
    }
    e
}

/// Tests if d is B-smooth: every prime-power component q^e of d satisfies
/// q^e <= B. Fails on d <= 0.
pub fn is_b_smooth(d: &BigInt, bound: u64) -> Result<bool> {
    if !d.is_positive() {
        return Err(Error::domain("smoothness is defined for positive integers"));
    }

    let mut d = d.clone();

    for q in prime_range(bound + 1) {
        let q = BigInt::from(q);
        let mut q_pow_e = BigInt::one();

        while d.mod_floor(&q).is_zero() {
            q_pow_e *= &q;
            if q_pow_e > BigInt::from(bound) {
                return Ok(false);
            }
            d /= &q;
        }
    }

    Ok(d.is_one())
}

const PRIME_CHECK_BASES: [u64; 15] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

/// Miller–Rabin primality test over a fixed set of witness bases. The error
/// probability is small enough that callers treat the test as exact.
pub fn is_probable_prime(input: &BigInt) -> bool {
    if input == &BigInt::from(2) || input == &BigInt::from(3) {
        return true;
    }
    if input < &BigInt::from(2) || input.is_even() {
        return false;
    }

    let one = BigInt::one();
    let minus_one = input - &one;

    let mut d = minus_one.clone();
    let mut s = 0u64;
    while d.is_even() {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &PRIME_CHECK_BASES {
        let a = BigInt::from(a);
        if &a >= input {
            continue;
        }

        let mut x = a.modpow(&d, input);
        if x == one || x == minus_one {
            continue;
        }

        for _ in 1..s {
            x = x.modpow(&BigInt::from(2), input);
            if x == minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}
