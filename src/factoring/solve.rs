// src/factoring/solve.rs

use std::collections::BTreeSet;

use log::{debug, info, trace};
use num::bigint::RandBigInt;
use num::{BigInt, Integer, One, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::factoring::factor_collection::FactorCollection;
use crate::group::CyclicGroupElement;
use crate::integer_math::modular::kappa;
use crate::integer_math::primes::prime_power_product;
use crate::order_finding::solve::{solve_j_for_r, SolutionMethods};

/// How the factor solver selects the modulus N' for sampling and
/// exponentiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptProcessCompositeFactors {
    /// Sample and exponentiate modulo N itself.
    JointlyModN,
    /// Sample and exponentiate modulo the product of the composite factors
    /// collected so far.
    JointlyModNp,
    /// Sample modulo the product of the composite factors, then
    /// exponentiate separately modulo each composite factor.
    SeparatelyModNp,
}

/// The optimisation switches of the factor solver. The defaults match the
/// behaviour with the best arithmetic cost on typical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorSolverOptions {
    /// Seed the collection with gcd(r, N) before iterating; splits N when
    /// prime factors occur with multiplicity.
    pub split_factors_with_multiplicity: bool,
    /// Report non-trivial factors found by accident while sampling x.
    pub report_accidental_factors: bool,
    /// Stop raising x once x^(2^s o) reaches the identity.
    pub abort_early: bool,
    /// Form x^(2^i o) by repeated squaring of x^o rather than from scratch.
    pub square: bool,
    /// Exclude one when sampling x.
    pub exclude_one: bool,
    /// The choice of modulus N' for sampling and exponentiation.
    pub process_composite_factors: OptProcessCompositeFactors,
}

impl Default for FactorSolverOptions {
    fn default() -> Self {
        FactorSolverOptions {
            split_factors_with_multiplicity: true,
            report_accidental_factors: true,
            abort_early: true,
            square: true,
            exclude_one: true,
            process_composite_factors: OptProcessCompositeFactors::SeparatelyModNp,
        }
    }
}

/// Attempts to factor N completely given the order r of an element selected
/// uniformly at random from the multiplicative group of the ring of
/// integers modulo N, or a positive integer multiple of that order.
///
/// Each iteration samples x from (Z/N'Z)*, raises it to 2^i o for o the odd
/// part of r times the cm-smooth prime power product, and splits the factor
/// collection by gcd(x^(2^i o) ± 1, N'). On success the set of distinct
/// prime factors of N is returned; when the iteration limit k or the
/// timeout is exhausted first, `IncompleteFactorization` carries every
/// factor found so far.
pub fn solve_r_for_factors<R: Rng>(
    r: &BigInt,
    n: &BigInt,
    c: u64,
    k: Option<u64>,
    options: &FactorSolverOptions,
    rng: &mut R,
    timeout: &Timeout,
) -> Result<BTreeSet<BigInt>> {
    if r < &BigInt::one() || n < &BigInt::from(2) || c == 0 {
        return Err(Error::domain("solve_r_for_factors requires r >= 1, N >= 2 and c >= 1"));
    }

    let m = n.bits();

    // rp = P r = 2^t o with o odd.
    let rp = prime_power_product(c * m) * r;
    let t = kappa(&rp);
    let o: BigInt = &rp >> t as usize;

    let mut collection = FactorCollection::new(n.clone())?;

    if options.split_factors_with_multiplicity {
        // If p^e divides N for e > 1, then p^(e-1) is likely to divide r.
        let d = r.gcd(n);
        if !d.is_one() {
            debug!("splitting N by gcd(r, N) before iterating");
            collection.add(&d);
        }
    }

    let incomplete = |collection: &FactorCollection| -> Error {
        Error::IncompleteFactorization(collection.found_factors())
    };

    let mut iteration = 0u64;

    loop {
        if collection.is_complete() {
            break;
        }

        iteration += 1;
        trace!("factoring iteration {}", iteration);

        if let Some(k) = k {
            if iteration > k {
                debug!("the iteration limit has been exceeded");
                return Err(incomplete(&collection));
            }
        }

        if timeout.is_elapsed() {
            debug!("the timeout has elapsed");
            return Err(incomplete(&collection));
        }

        // The modulus to sample from.
        let np_sample = match options.process_composite_factors {
            OptProcessCompositeFactors::JointlyModN => n.clone(),
            OptProcessCompositeFactors::JointlyModNp
            | OptProcessCompositeFactors::SeparatelyModNp => collection.residual(),
        };

        // Sample x uniformly from (Z/N'Z)*.
        let x = loop {
            let x = rng.gen_bigint_range(&BigInt::zero(), &np_sample);
            if x.is_zero() {
                continue;
            }
            if x.is_one() && options.exclude_one {
                continue;
            }

            let d = x.gcd(&np_sample);
            if d.is_one() {
                break x;
            }

            // x shares a factor with N'.
            if options.report_accidental_factors {
                debug!("reporting the factor {} found by accident while sampling", d);
                collection.add(&d);
                if collection.is_complete() {
                    break x;
                }
            }
        };

        if collection.is_complete() {
            break;
        }

        // The moduli to exponentiate against.
        let moduli = match options.process_composite_factors {
            OptProcessCompositeFactors::SeparatelyModNp => collection.composite_factors(),
            OptProcessCompositeFactors::JointlyModN
            | OptProcessCompositeFactors::JointlyModNp => vec![np_sample.clone()],
        };

        for np in moduli {
            let xp = x.mod_floor(&np);
            if xp.is_zero() {
                continue;
            }

            let mut y = xp.modpow(&o, &np);

            if y.is_one() && options.abort_early {
                // Every subsequent square is one as well.
                continue;
            }

            split_by_power(&mut collection, &y, &np);

            for i in 1..=t {
                if options.square {
                    y = y.modpow(&BigInt::from(2), &np);
                } else {
                    let exponent = (BigInt::one() << i as usize) * &o;
                    y = xp.modpow(&exponent, &np);
                }

                if y.is_one() && options.abort_early {
                    break;
                }

                split_by_power(&mut collection, &y, &np);
            }
        }
    }

    // The factorization is complete; check it exhausts N exactly.
    let primes = collection.prime_factors();
    let mut remaining = n.clone();
    for p in &primes {
        if !remaining.mod_floor(p).is_zero() {
            return Err(Error::domain("the collected primes do not divide N"));
        }
        while remaining.mod_floor(p).is_zero() {
            remaining /= p;
        }
    }
    if !remaining.is_one() {
        return Err(Error::domain("the collected primes do not exhaust N"));
    }

    info!("factored N into {} distinct primes", primes.len());
    Ok(primes)
}

/// Splits the collection by gcd(y - 1, N') and gcd(y + 1, N').
fn split_by_power(collection: &mut FactorCollection, y: &BigInt, np: &BigInt) {
    let one = BigInt::one();

    for candidate in [y - &one, y + &one] {
        let d = candidate.gcd(np);
        if d > one && &d < np {
            collection.add(&d);
        }
    }
}

/// Attempts to factor N completely from a frequency j yielded by the
/// quantum order-finding circuit run on g modulo N: solves j for a multiple
/// of the order of g, then solves that multiple for the factors.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_for_factors<G: CyclicGroupElement, R: Rng>(
    j: &BigInt,
    m: u32,
    l: u32,
    g: &G,
    n: &BigInt,
    c_solve: u64,
    c_factor: u64,
    b: u64,
    k: Option<u64>,
    method: SolutionMethods,
    options: &FactorSolverOptions,
    rng: &mut R,
    timeout: &Timeout,
) -> Result<Option<BTreeSet<BigInt>>> {
    let r = solve_j_for_r(
        j, m, l, g, c_solve, b, true, method, true, true, timeout,
    )?;

    match r {
        None => Ok(None),
        Some(r) => {
            let factors = solve_r_for_factors(&r, n, c_factor, k, options, rng, timeout)?;
            Ok(Some(factors))
        }
    }
}

/// Convenience wrapper for `solve_j_for_factors` with g given as an integer
/// modulo N.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_for_factors_mod_n<R: Rng>(
    j: &BigInt,
    m: u32,
    l: u32,
    g: &BigInt,
    n: &BigInt,
    c_solve: u64,
    c_factor: u64,
    b: u64,
    k: Option<u64>,
    method: SolutionMethods,
    options: &FactorSolverOptions,
    rng: &mut R,
    timeout: &Timeout,
) -> Result<Option<BTreeSet<BigInt>>> {
    let g = crate::group::IntegerModRingElement::new(g.clone(), n.clone())?;
    solve_j_for_factors(
        j, m, l, &g, n, c_solve, c_factor, b, k, method, options, rng, timeout,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> impl Rng {
        rand::rngs::StdRng::seed_from_u64(0x5eed)
    }

    fn factor_set(values: &[i64]) -> BTreeSet<BigInt> {
        values.iter().map(|&x| BigInt::from(x)).collect()
    }

    #[test]
    fn test_factors_fifteen_from_order_four() {
        // The order of 2 modulo 15 is 4.
        let factors = solve_r_for_factors(
            &BigInt::from(4),
            &BigInt::from(15),
            1,
            None,
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(factors, factor_set(&[3, 5]));
    }

    #[test]
    fn test_factors_rsa_modulus_from_group_order() {
        // N = 143 = 11 * 13; lambda(143) = lcm(10, 12) = 60.
        let factors = solve_r_for_factors(
            &BigInt::from(60),
            &BigInt::from(143),
            1,
            None,
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(factors, factor_set(&[11, 13]));
    }

    #[test]
    fn test_factors_with_multiplicity() {
        // N = 99 = 3^2 * 11; r = lambda(99) = 30 and gcd(30, 99) = 3 splits
        // the square immediately.
        let factors = solve_r_for_factors(
            &BigInt::from(30),
            &BigInt::from(99),
            1,
            None,
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(factors, factor_set(&[3, 11]));
    }

    #[test]
    fn test_every_processing_option() {
        for process in [
            OptProcessCompositeFactors::JointlyModN,
            OptProcessCompositeFactors::JointlyModNp,
            OptProcessCompositeFactors::SeparatelyModNp,
        ] {
            let options = FactorSolverOptions {
                process_composite_factors: process,
                ..FactorSolverOptions::default()
            };
            let factors = solve_r_for_factors(
                &BigInt::from(60),
                &BigInt::from(143),
                1,
                None,
                &options,
                &mut rng(),
                &Timeout::indefinite(),
            )
            .unwrap();
            assert_eq!(factors, factor_set(&[11, 13]), "option {:?}", process);
        }
    }

    #[test]
    fn test_square_and_abort_early_off() {
        let options = FactorSolverOptions {
            square: false,
            abort_early: false,
            ..FactorSolverOptions::default()
        };
        let factors = solve_r_for_factors(
            &BigInt::from(4),
            &BigInt::from(15),
            1,
            None,
            &options,
            &mut rng(),
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(factors, factor_set(&[3, 5]));
    }

    #[test]
    fn test_iteration_limit_surfaces_partial_factors() {
        // With k = 0 iterations no factor of a semiprime can be found.
        let result = solve_r_for_factors(
            &BigInt::from(60),
            &BigInt::from(143),
            1,
            Some(0),
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        );
        match result {
            Err(Error::IncompleteFactorization(partial)) => {
                assert!(partial.contains(&BigInt::from(143)));
            }
            other => panic!("expected an incomplete factorization, got {:?}", other),
        }
    }

    #[test]
    fn test_elapsed_timeout_surfaces_partial_factors() {
        let timeout = Timeout::after_seconds(0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        let result = solve_r_for_factors(
            &BigInt::from(60),
            &BigInt::from(143),
            1,
            None,
            &FactorSolverOptions::default(),
            &mut rng(),
            &timeout,
        );
        assert!(matches!(result, Err(Error::IncompleteFactorization(_))));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(solve_r_for_factors(
            &BigInt::zero(),
            &BigInt::from(15),
            1,
            None,
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        )
        .is_err());
        assert!(solve_r_for_factors(
            &BigInt::from(4),
            &BigInt::one(),
            1,
            None,
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        )
        .is_err());
    }

    #[test]
    fn test_solve_j_for_factors_chain() {
        use crate::group::IntegerModRingElement;

        // N = 15, g = 2 of order 4; m = l = 4 and j at the peak for z = 1:
        // j = round(2^8 / 4) = 64.
        let n = BigInt::from(15);
        let g = IntegerModRingElement::new(BigInt::from(2), n.clone()).unwrap();

        let factors = solve_j_for_factors(
            &BigInt::from(64),
            4,
            4,
            &g,
            &n,
            1,
            1,
            100,
            None,
            SolutionMethods::LatticeShortestVector,
            &FactorSolverOptions::default(),
            &mut rng(),
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(factors, Some(factor_set(&[3, 5])));
    }
}
