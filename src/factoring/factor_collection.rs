// src/factoring/factor_collection.rs

use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use num::integer::Roots;
use num::{BigInt, Integer, One, Signed};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::integer_math::primes::is_probable_prime;

/// The multiset of pairwise-coprime factors of N collected so far, each with
/// a multiplicity and a primality flag.
///
/// The product of the factors raised to their multiplicities is N at all
/// times; `add(d)` only splits existing factors against the hint d, it never
/// contributes new content. Perfect powers are reduced to their base with
/// the exponent folded into the multiplicity. Primality is a probabilistic
/// Miller–Rabin test, treated as exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorCollection {
    n: BigInt,
    factors: BTreeMap<BigInt, FactorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FactorEntry {
    multiplicity: u64,
    prime: bool,
}

impl FactorCollection {
    /// Starts the collection from N > 1 itself.
    pub fn new(n: BigInt) -> Result<Self> {
        if n < BigInt::from(2) {
            return Err(Error::domain("the integer to factor must exceed one"));
        }

        let mut collection = FactorCollection { n: n.clone(), factors: BTreeMap::new() };
        collection.insert(n, 1);
        Ok(collection)
    }

    pub fn n(&self) -> &BigInt {
        &self.n
    }

    /// True iff every collected factor is a known prime.
    pub fn is_complete(&self) -> bool {
        self.factors.values().all(|entry| entry.prime)
    }

    /// The product of the composite factors (with multiplicity), or one
    /// when the factorization is complete.
    pub fn residual(&self) -> BigInt {
        self.factors
            .iter()
            .filter(|(_, entry)| !entry.prime)
            .map(|(factor, entry)| factor.pow(entry.multiplicity as u32))
            .product()
    }

    /// The composite factors, each taken once.
    pub fn composite_factors(&self) -> Vec<BigInt> {
        self.factors
            .iter()
            .filter(|(_, entry)| !entry.prime)
            .map(|(factor, _)| factor.clone())
            .collect()
    }

    /// The distinct prime factors found so far.
    pub fn prime_factors(&self) -> BTreeSet<BigInt> {
        self.factors
            .iter()
            .filter(|(_, entry)| entry.prime)
            .map(|(factor, _)| factor.clone())
            .collect()
    }

    /// Every distinct factor found so far, prime or composite.
    pub fn found_factors(&self) -> BTreeSet<BigInt> {
        self.factors.keys().cloned().collect()
    }

    /// Splits the collection against the factor hint d. Returns true iff
    /// some factor was split.
    pub fn add(&mut self, d: &BigInt) -> bool {
        let d = d.abs();
        if d <= BigInt::one() {
            return false;
        }

        let mut changed = false;

        // Split every factor sharing content with d; the split parts are
        // re-inserted and re-examined until everything is coprime to d.
        loop {
            let mut split: Option<(BigInt, BigInt)> = None;

            for factor in self.factors.keys() {
                let g = factor.gcd(&d);
                if !g.is_one() && &g != factor {
                    split = Some((factor.clone(), g));
                    break;
                }
            }

            let (factor, g) = match split {
                Some(pair) => pair,
                None => break,
            };

            trace!("splitting {} by {}", factor, g);
            let entry = self
                .factors
                .remove(&factor)
                .expect("the factor was found in the collection");
            let cofactor = &factor / &g;

            self.insert(g, entry.multiplicity);
            self.insert(cofactor, entry.multiplicity);
            changed = true;
        }

        if changed {
            self.normalize();
        }

        changed
    }

    /// Splits factors against each other until all are pairwise coprime.
    fn normalize(&mut self) {
        loop {
            let mut split: Option<(BigInt, BigInt)> = None;

            'outer: for (i, a) in self.factors.keys().enumerate() {
                for b in self.factors.keys().skip(i + 1) {
                    let g = a.gcd(b);
                    if !g.is_one() {
                        let widest = if &g == a { b } else { a };
                        split = Some((widest.clone(), g));
                        break 'outer;
                    }
                }
            }

            let (factor, g) = match split {
                Some(pair) => pair,
                None => break,
            };

            let entry = self
                .factors
                .remove(&factor)
                .expect("the factor was found in the collection");
            let cofactor = &factor / &g;

            self.insert(g, entry.multiplicity);
            self.insert(cofactor, entry.multiplicity);
        }
    }

    /// Inserts a factor with the given multiplicity, reducing perfect
    /// powers and merging with an existing entry.
    fn insert(&mut self, factor: BigInt, multiplicity: u64) {
        debug_assert!(factor > BigInt::one());

        // Reduce a perfect power to its base.
        let (base, exponent) = reduce_perfect_power(factor);
        let multiplicity = multiplicity * exponent;

        if let Some(entry) = self.factors.get_mut(&base) {
            entry.multiplicity += multiplicity;
            return;
        }

        let prime = is_probable_prime(&base);
        self.factors.insert(base, FactorEntry { multiplicity, prime });
    }
}

/// Returns (b, e) with b^e equal to the input and e maximal.
fn reduce_perfect_power(value: BigInt) -> (BigInt, u64) {
    let bits = value.bits();

    for exponent in (2..=bits.max(2)).rev() {
        let root = value.nth_root(exponent as u32);
        if root.pow(exponent as u32) == value {
            let (base, inner) = reduce_perfect_power(root);
            return (base, inner * exponent);
        }
    }

    (value, 1)
}
