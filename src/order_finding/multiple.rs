// src/order_finding/multiple.rs

use log::debug;
use num::{BigInt, BigRational, Integer, One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::group::CyclicGroupElement;
use crate::integer_math::primes::prime_power_product;
use crate::lattice::enumerate::{enumerate, solve_svp};
use crate::lattice::lll::lll;
use crate::linear_algebra::matrix::IntMatrix;
use crate::order_finding::algorithms::{
    is_valid_r_tilde, recover_order_binary, recover_order_speculative,
};
use crate::order_finding::candidate_collection::CandidateCollection;

/// How the multi-frequency order-finding solver searches the reduced
/// lattice for the short vector that carries r_tilde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumerationOptions {
    /// No search beyond the reduced basis rows themselves.
    Skip,
    /// Enumerate the tau-bounded ball, stopping at the first verified
    /// candidate.
    Enumerate,
    /// Solve the shortest vector problem exactly and use that single
    /// candidate.
    ShortestVector,
    /// Enumerate the tau-bounded ball, stopping at the first verified
    /// candidate.
    BoundedByTau,
    /// Enumerate the tau-bounded ball exhaustively and keep the least order
    /// over all verified candidates.
    BoundedByTauComplete,
}

/// Attempts to compute the order r of g from n frequencies j_1, .., j_n
/// yielded by independent runs of the quantum order-finding circuit.
///
/// The frequencies span the (n+1)-dimensional lattice with rows
/// b_0 = (j_1, .., j_n, 2^tau) and b_i = 2^(m+l) e_i; the vector
/// r b_0 - sum z_i b_i = (alpha_1, .., alpha_n, 2^tau r) is short when every
/// j_i sits near a peak, so its last coordinate, divided by 2^tau, is a
/// candidate for r_tilde. The basis is delta-LLL-reduced and searched per
/// the enumeration option; candidates are verified against g^e and completed
/// through the missing cm-smooth factor.
#[allow(clippy::too_many_arguments)]
pub fn solve_multiple_j_for_r<G: CyclicGroupElement>(
    j_list: &[BigInt],
    m: u32,
    l: u32,
    g: &G,
    c: u64,
    tau: u32,
    delta: f64,
    precision: Option<u32>,
    enumeration: EnumerationOptions,
    speculative: bool,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    let n = j_list.len();
    if n == 0 {
        return Err(Error::domain("at least one frequency is required"));
    }

    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;
    for j in j_list {
        if j.is_negative() || j >= &pow2ml {
            return Err(Error::domain("every frequency must lie on [0, 2^(m + l))"));
        }
    }

    let pow2tau: BigInt = BigInt::one() << tau as usize;

    // Rows: (j_1, .., j_n, 2^tau) and the modulus rows 2^(m+l) e_i.
    let mut basis: IntMatrix = Vec::with_capacity(n + 1);
    let mut first_row: Vec<BigInt> = j_list.to_vec();
    first_row.push(pow2tau.clone());
    basis.push(first_row);
    for i in 0..n {
        let mut row = vec![BigInt::zero(); n + 1];
        row[i] = pow2ml.clone();
        basis.push(row);
    }

    let (reduced, gs) = lll(&basis, delta, timeout, precision)?;

    // Pre-compute e and g^e for the verification of candidates.
    let e = prime_power_product(c * m as u64);
    let gp = g.pow(&e);

    let complete_order = |r_tilde: &BigInt| -> Result<Option<BigInt>> {
        if speculative {
            recover_order_speculative(g, r_tilde, m, c, timeout)
        } else {
            recover_order_binary(g, r_tilde, m, c, timeout)
        }
    };

    let mut verified = CandidateCollection::new();

    // Extracts a candidate r_tilde from a lattice vector's last coordinate
    // and verifies it; returns true iff it passed.
    let consider = |vector: &[BigInt], verified: &mut CandidateCollection| -> Result<bool> {
        let last = &vector[n];
        let (candidate, remainder) = last.div_rem(&pow2tau);
        if !remainder.is_zero() {
            return Ok(false);
        }
        let candidate = candidate.abs();

        if !is_valid_r_tilde(&candidate, m) {
            return Ok(false);
        }
        if verified.contains(&candidate) {
            return Ok(true);
        }

        timeout.check()?;

        if gp.pow(&candidate).is_identity() {
            verified.add(candidate);
            Ok(true)
        } else {
            Ok(false)
        }
    };

    // The reduced rows are candidates under every option.
    for row in &reduced {
        consider(row, &mut verified)?;
    }

    match enumeration {
        EnumerationOptions::Skip => {}
        EnumerationOptions::ShortestVector => {
            let shortest = solve_svp(&reduced, &gs, timeout)?;
            consider(&shortest, &mut verified)?;
        }
        EnumerationOptions::Enumerate
        | EnumerationOptions::BoundedByTau
        | EnumerationOptions::BoundedByTauComplete => {
            // Radius sqrt(n+1) 2^(m+tau): every good frequency contributes a
            // coordinate of magnitude at most 2^(m+tau), as does 2^tau r.
            let radius2 = BigRational::from_integer(
                BigInt::from(n as u64 + 1) * (BigInt::one() << (2 * (m + tau)) as usize),
            );

            let found = enumerate(&reduced, &radius2, None, &gs, timeout)?;
            debug!(
                "solve_multiple_j_for_r: enumerated {} lattice points",
                found.len()
            );

            let exhaustive = enumeration == EnumerationOptions::BoundedByTauComplete;
            for point in &found {
                let passed = consider(&point.vector, &mut verified)?;
                if passed && !exhaustive {
                    break;
                }
            }
        }
    }

    // Complete every surviving candidate and keep the least order found.
    let mut best: Option<BigInt> = None;
    let candidates: Vec<BigInt> = verified.iter().cloned().collect();
    for candidate in candidates {
        if let Some(r) = complete_order(&candidate)? {
            if best.as_ref().map_or(true, |current| &r < current) {
                best = Some(r);
            }
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SimulatedGroupElement;

    fn optimal_j(z: u64, r: u64, m: u32, l: u32) -> BigInt {
        let pow2ml = BigInt::one() << (m + l) as usize;
        let numerator = &pow2ml * BigInt::from(z) * 2 + BigInt::from(r);
        (numerator / (BigInt::from(r) * 2u32)).mod_floor(&pow2ml)
    }

    fn run(enumeration: EnumerationOptions) -> Option<BigInt> {
        let r = 23u64;
        let m = 5u32;
        let l = 5u32;
        let g = SimulatedGroupElement::generator(BigInt::from(r)).unwrap();

        let j_list = vec![
            optimal_j(7, r, m, l),
            optimal_j(11, r, m, l),
            optimal_j(19, r, m, l),
        ];

        solve_multiple_j_for_r(
            &j_list,
            m,
            l,
            &g,
            1,
            4,
            0.99,
            None,
            enumeration,
            true,
            &Timeout::indefinite(),
        )
        .unwrap()
    }

    #[test]
    fn test_skip_uses_reduced_rows() {
        assert_eq!(run(EnumerationOptions::Skip), Some(BigInt::from(23)));
    }

    #[test]
    fn test_shortest_vector_option() {
        assert_eq!(run(EnumerationOptions::ShortestVector), Some(BigInt::from(23)));
    }

    #[test]
    fn test_bounded_enumeration_options() {
        assert_eq!(run(EnumerationOptions::BoundedByTau), Some(BigInt::from(23)));
        assert_eq!(
            run(EnumerationOptions::BoundedByTauComplete),
            Some(BigInt::from(23))
        );
    }

    #[test]
    fn test_rejects_empty_frequency_list() {
        let g = SimulatedGroupElement::generator(BigInt::from(23)).unwrap();
        assert!(solve_multiple_j_for_r(
            &[],
            5,
            5,
            &g,
            1,
            4,
            0.99,
            None,
            EnumerationOptions::Skip,
            true,
            &Timeout::indefinite(),
        )
        .is_err());
    }

    #[test]
    fn test_approximate_gram_schmidt_path() {
        let r = 23u64;
        let m = 5u32;
        let l = 5u32;
        let g = SimulatedGroupElement::generator(BigInt::from(r)).unwrap();
        let j_list = vec![optimal_j(7, r, m, l), optimal_j(11, r, m, l)];

        let found = solve_multiple_j_for_r(
            &j_list,
            m,
            l,
            &g,
            1,
            4,
            0.99,
            Some(128),
            EnumerationOptions::Skip,
            true,
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(found, Some(BigInt::from(23)));
    }
}
