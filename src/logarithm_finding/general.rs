// src/logarithm_finding/general.rs

use log::{debug, trace};
use num::{BigInt, BigRational, Integer, One, Zero};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::group::CyclicGroupElement;
use crate::integer_math::modular::{mod_inv, truncmod};
use crate::lattice::babai::babai;
use crate::lattice::enumerate::{enumerate, solve_cvp};
use crate::lattice::lll::lll;
use crate::linear_algebra::matrix::IntMatrix;
use crate::linear_algebra::vector::to_rational;
use crate::logarithm_finding::EnumerationOptions;

/// The default bound on the search space in eta.
pub const DEFAULT_ETA_BOUND: u64 = 1000;

/// The default bound on the search space in t.
pub const DEFAULT_T_BOUND: u64 = 1000;

/// Derives the rounded multipliers z and w for a frequency pair (j, k): z
/// is the nearest multiple of 2^(m+sigma) in r j, and w the nearest
/// multiple of 2^l in r k.
fn rounded_multipliers(
    j: &BigInt,
    k: &BigInt,
    m: u32,
    sigma: u32,
    l: u32,
    r: &BigInt,
) -> Result<(BigInt, BigInt)> {
    let pow2ms: BigInt = BigInt::one() << (m + sigma) as usize;
    let pow2l: BigInt = BigInt::one() << l as usize;

    let rj = r * j;
    let z = (&rj - truncmod(&rj, &pow2ms)?) / &pow2ms;

    let rk = r * k;
    let w = (&rk - truncmod(&rk, &pow2l)?) / &pow2l;

    Ok((z, w))
}

/// Attempts to compute a general discrete logarithm d from a frequency pair
/// (j, k), given g, x = g^d and the order r of g.
///
/// For each offset eta in [-B_eta, B_eta] with z + eta invertible modulo r,
/// the candidates d = (t - w) (z + eta)^-1 (mod r) are scanned for t in
/// [-B_t, B_t], stepping x through pre-computed powers so each candidate
/// costs one group multiplication. The first candidate with g^d = x is
/// returned.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_k_for_d_given_r<G: CyclicGroupElement>(
    j: &BigInt,
    k: &BigInt,
    m: u32,
    sigma: u32,
    l: u32,
    g: &G,
    x: &G,
    r: &BigInt,
    b_eta: u64,
    b_t: u64,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    if m == 0 {
        return Err(Error::domain("m must be positive"));
    }
    if l == 0 {
        return Err(Error::domain("l must be positive"));
    }

    let (z, w) = rounded_multipliers(j, k, m, sigma, l, r)?;
    trace!("solve_j_k_for_d_given_r: z = {}, w = {}", z, w);

    for abs_eta in 0..=b_eta {
        timeout.check()?;

        for sign_eta in [1i64, -1] {
            if abs_eta == 0 && sign_eta == -1 {
                continue;
            }
            let eta = BigInt::from(sign_eta * abs_eta as i64);

            let z_plus_eta = &z + &eta;
            let inverse = match mod_inv(&z_plus_eta, r) {
                Some(inverse) => inverse,
                None => continue,
            };

            // d steps by ±(z + eta)^-1 as t steps by ±1; pre-compute the
            // stepping powers and the starting point at t = 0.
            let x_step_plus = g.pow(&inverse);
            let x_step_minus = x_step_plus.inverse();
            let x0 = x_step_minus.pow(&w);

            let mut candidate_x_plus = x0.clone();
            let mut candidate_x_minus = x0;

            for abs_t in 0..=b_t {
                timeout.check()?;

                for sign_t in [1i64, -1] {
                    if abs_t == 0 && sign_t == -1 {
                        continue;
                    }
                    let t = BigInt::from(sign_t * abs_t as i64);

                    let candidate_x;
                    if sign_t == 1 {
                        candidate_x = candidate_x_plus.clone();
                        candidate_x_plus = candidate_x_plus.multiply(&x_step_plus);
                    } else {
                        candidate_x_minus = candidate_x_minus.multiply(&x_step_minus);
                        candidate_x = candidate_x_minus.clone();
                    }

                    if candidate_x == *x {
                        let candidate_d = ((&t - &w) * &inverse).mod_floor(r);
                        debug!(
                            "solve_j_k_for_d_given_r: matched at eta = {}, t = {}",
                            eta, t
                        );
                        return Ok(Some(candidate_d));
                    }
                }
            }
        }
    }

    Ok(None)
}

/// Attempts to compute a general discrete logarithm d from n frequency
/// pairs (j_i, k_i), given g, x = g^d and the order r of g.
///
/// The rounded multipliers z_i and w_i of each pair satisfy
/// d z_i + w_i = t_i (mod r) with small t_i, so d is encoded in the lattice
/// with rows b_0 = (z_1, .., z_n, 2^tau) and b_i = r e_i against the target
/// v = (-w_1, .., -w_n, 0): the vector u = d b_0 - sum y_i b_i close to v
/// carries 2^tau d in its last coordinate. The basis is delta-LLL-reduced
/// at the given precision and searched per the enumeration option; every
/// candidate d is verified against x = g^d.
#[allow(clippy::too_many_arguments)]
pub fn solve_multiple_j_k_for_d_given_r<G: CyclicGroupElement>(
    j_k_list: &[(BigInt, BigInt)],
    m: u32,
    sigma: u32,
    l: u32,
    g: &G,
    x: &G,
    r: &BigInt,
    tau: u32,
    delta: f64,
    precision: Option<u32>,
    enumeration: EnumerationOptions,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    let n = j_k_list.len();
    if n == 0 {
        return Err(Error::domain("at least one frequency pair is required"));
    }
    if m == 0 || r >= &(BigInt::one() << m as usize) {
        return Err(Error::domain("m must be positive with r < 2^m"));
    }
    if l == 0 {
        return Err(Error::domain("l must be positive"));
    }

    let pow2tau: BigInt = BigInt::one() << tau as usize;

    let mut z_list: Vec<BigInt> = Vec::with_capacity(n);
    let mut w_list: Vec<BigInt> = Vec::with_capacity(n);
    for (j, k) in j_k_list {
        let (z, w) = rounded_multipliers(j, k, m, sigma, l, r)?;
        z_list.push(z.mod_floor(r));
        w_list.push(w);
    }

    // Rows: (z_1, .., z_n, 2^tau) and the modulus rows r e_i.
    let mut basis: IntMatrix = Vec::with_capacity(n + 1);
    let mut first_row = z_list.clone();
    first_row.push(pow2tau.clone());
    basis.push(first_row);
    for i in 0..n {
        let mut row = vec![BigInt::zero(); n + 1];
        row[i] = r.clone();
        basis.push(row);
    }

    let (reduced, gs) = lll(&basis, delta, timeout, precision)?;

    // The target vector.
    let mut v: Vec<BigInt> = w_list.iter().map(|w| -w).collect();
    v.push(BigInt::zero());
    let v_rational = to_rational(&v);

    // Derives d from a candidate lattice vector and verifies it.
    let derive = |u: &[BigInt]| -> Option<BigInt> {
        let difference = &u[n] - &v[n];
        let (d, remainder) = difference.div_rem(&pow2tau);
        if !remainder.is_zero() {
            return None;
        }
        let d = d.mod_floor(r);
        if g.pow(&d) == *x {
            Some(d)
        } else {
            None
        }
    };

    match enumeration {
        EnumerationOptions::Skip => {
            let estimate = babai(&reduced, &v_rational, &gs)?;
            Ok(derive(&estimate))
        }
        EnumerationOptions::ClosestVector => {
            let closest = solve_cvp(&reduced, &v_rational, &gs, timeout)?;
            Ok(derive(&closest))
        }
        EnumerationOptions::Enumerate | EnumerationOptions::BoundedByTau => {
            // The last coordinate of u - v is below 2^tau r < 2^(m+tau); the
            // residuals t_i are far smaller.
            let radius2 = BigRational::from_integer(
                BigInt::from(n as u64 + 1) * (BigInt::one() << (2 * (m + tau)) as usize),
            );

            let found = enumerate(&reduced, &radius2, Some(&v_rational), &gs, timeout)?;
            debug!(
                "solve_multiple_j_k_for_d_given_r: enumerated {} lattice points",
                found.len()
            );

            for point in &found {
                timeout.check()?;
                if let Some(d) = derive(&point.vector) {
                    return Ok(Some(d));
                }
            }

            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SimulatedGroupElement;

    // An optimal frequency pair for the general discrete logarithm
    // algorithm: j = round(2^(m+sigma) z0 / r) for a peak index z0, and
    // k = round(2^l ((-d z0) mod r) / r), so that d z0 + w = 0 (mod r) for
    // the rounded multipliers.
    fn optimal_pair(z0: u64, d: u64, r: u64, m: u32, sigma: u32, l: u32) -> (BigInt, BigInt) {
        let r_big = BigInt::from(r);
        let pow2ms = BigInt::one() << (m + sigma) as usize;
        let pow2l = BigInt::one() << l as usize;

        let j = (&pow2ms * BigInt::from(z0) * 2u32 + &r_big) / (&r_big * 2u32);
        let neg_dz = (-(BigInt::from(d) * BigInt::from(z0))).mod_floor(&r_big);
        let k = ((&pow2l * &neg_dz * 2u32 + &r_big) / (&r_big * 2u32)).mod_floor(&pow2l);

        (j.mod_floor(&pow2ms), k)
    }

    fn simulated_group(order: u64) -> SimulatedGroupElement {
        SimulatedGroupElement::generator(BigInt::from(order)).unwrap()
    }

    #[test]
    fn test_single_pair_recovers_general_logarithm() {
        let r = 3449u64;
        let m = 12u32;
        let sigma = 4u32;
        let l = 12u32;
        let d = 2025u64;

        let g = simulated_group(r);
        let x = g.pow(&BigInt::from(d));

        let (j, k) = optimal_pair(1234, d, r, m, sigma, l);

        let found = solve_j_k_for_d_given_r(
            &j,
            &k,
            m,
            sigma,
            l,
            &g,
            &x,
            &BigInt::from(r),
            DEFAULT_ETA_BOUND,
            DEFAULT_T_BOUND,
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(found, Some(BigInt::from(d)));
    }

    #[test]
    fn test_single_pair_another_peak() {
        let r = 3449u64;
        let m = 12u32;
        let sigma = 4u32;
        let l = 12u32;
        let d = 97u64;

        let g = simulated_group(r);
        let x = g.pow(&BigInt::from(d));

        let (j, k) = optimal_pair(2600, d, r, m, sigma, l);

        let found = solve_j_k_for_d_given_r(
            &j,
            &k,
            m,
            sigma,
            l,
            &g,
            &x,
            &BigInt::from(r),
            DEFAULT_ETA_BOUND,
            DEFAULT_T_BOUND,
            &Timeout::indefinite(),
        )
        .unwrap();
        assert_eq!(found, Some(BigInt::from(d)));
    }

    #[test]
    fn test_single_pair_rejects_bad_parameters() {
        let g = simulated_group(3449);
        let x = g.pow(&BigInt::from(5));
        for (m, l) in [(0u32, 12u32), (12, 0)] {
            assert!(solve_j_k_for_d_given_r(
                &BigInt::zero(),
                &BigInt::zero(),
                m,
                4,
                l,
                &g,
                &x,
                &BigInt::from(3449),
                10,
                10,
                &Timeout::indefinite(),
            )
            .is_err());
        }
    }

    #[test]
    fn test_multiple_pairs_given_r() {
        // A small group keeps the exhaustive lattice searches cheap; the
        // logarithm is small so that the wanted vector is the unique
        // closest lattice point to the target.
        let r = 101u64;
        let m = 7u32;
        let sigma = 4u32;
        let l = 7u32;
        let d = 5u64;

        let g = simulated_group(r);
        let x = g.pow(&BigInt::from(d));

        let pairs: Vec<(BigInt, BigInt)> = [13u64, 47, 88]
            .iter()
            .map(|&z0| optimal_pair(z0, d, r, m, sigma, l))
            .collect();

        for option in [
            EnumerationOptions::ClosestVector,
            EnumerationOptions::BoundedByTau,
        ] {
            let found = solve_multiple_j_k_for_d_given_r(
                &pairs,
                m,
                sigma,
                l,
                &g,
                &x,
                &BigInt::from(r),
                0,
                0.99,
                None,
                option,
                &Timeout::indefinite(),
            )
            .unwrap();
            assert_eq!(found, Some(BigInt::from(d)), "option {:?}", option);
        }
    }
}
