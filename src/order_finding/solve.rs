// src/order_finding/solve.rs

use std::collections::BTreeSet;

use log::{debug, trace};
use num::{BigInt, Integer, One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::group::CyclicGroupElement;
use crate::integer_math::continued_fractions::continued_fractions;
use crate::integer_math::primes::prime_power_product;
use crate::lattice::lagrange::lagrange;
use crate::linear_algebra::matrix::IntMatrix;
use crate::linear_algebra::scalar::{bigint_to_rug, rug_to_bigint};
use crate::order_finding::algorithms::{
    is_valid_r_tilde, recover_multiple_of_r, recover_order_binary, recover_order_speculative,
};
use crate::order_finding::candidate_collection::CandidateCollection;

/// The default bound on the offset in j: the solver tries j, j + 1, j - 1,
/// .. out to j ± B in the hope of hitting an optimal frequency.
pub const DEFAULT_OFFSET_BOUND: u64 = 1000;

/// The methods available for lifting a frequency j to a candidate r_tilde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionMethods {
    /// Expand j / 2^(m+l) in continued fractions and take the last
    /// denominator below 2^((m+l)/2). Requires r^2 < 2^(m+l).
    ContinuedFractions,
    /// Lagrange-reduce the two-dimensional lattice spanned by (j, 1/2) and
    /// (2^(m+l), 0); the shortest non-zero vector carries r_tilde in its
    /// second coordinate. Requires r^2 < 2^(m+l).
    LatticeShortestVector,
    /// Reduce the same lattice and enumerate all vectors inside a ball of
    /// radius 2^(m - 1/2); admits l = m - Delta at the cost of enumerating
    /// on the order of 2^Delta vectors.
    LatticeEnumerate,
}

/// Lifts an optimal frequency j to r_tilde through continued fractions: the
/// last convergent denominator of j / 2^(m+l) below 2^((m+l)/2).
pub fn solve_j_for_r_tilde_continued_fractions(
    j: &BigInt,
    m: u32,
    l: u32,
) -> Result<Option<BigInt>> {
    let denominators = continued_fractions(j, m, l, None)?;
    Ok(denominators.into_iter().last())
}

/// Lifts an optimal frequency j to r_tilde through the shortest vector of
/// the two-dimensional lattice spanned by (j, 1/2) and (2^(m+l), 0), scaled
/// by two to stay integral.
///
/// Row multiples from the reduction at an adjacent offset in j seed the
/// reduction; the multiples that reduced this offset are returned for the
/// next one.
pub fn solve_j_for_r_tilde_lattice_svp(
    j: &BigInt,
    m: u32,
    l: u32,
    multiples: Option<&IntMatrix>,
) -> Result<(BigInt, IntMatrix)> {
    let pow2ml1: BigInt = BigInt::one() << (m + l + 1) as usize;

    let a: IntMatrix = vec![
        vec![j * 2, BigInt::one()],
        vec![pow2ml1, BigInt::zero()],
    ];

    let (reduced, multiples) = lagrange(&a, multiples)?;
    let r_tilde_candidate = reduced[0][1].abs();

    Ok((r_tilde_candidate, multiples))
}

/// The candidate bookkeeping threaded through an offset scan.
///
/// `filtered` collects candidates that passed the verification
/// g^(e * r_tilde) = 1; `dismissed` remembers reduced candidates that
/// failed, so they are never exponentiated twice; `mu` is the best known
/// multiple of r (zero while none is known) and shrinks candidates by a gcd
/// before they are tested.
#[derive(Debug, Clone, Default)]
pub struct CandidateSearchState {
    pub filtered: CandidateCollection,
    pub dismissed: BTreeSet<BigInt>,
    pub mu: BigInt,
}

impl CandidateSearchState {
    pub fn new() -> Self {
        CandidateSearchState::default()
    }
}

// Floating point helpers for the two-dimensional enumeration. The exponent
// range of these floats is unbounded, so very large lattices do not
// overflow the pruning bounds.
const ENUM_PRECISION: u32 = 53;

fn float_of(x: &BigInt) -> rug::Float {
    rug::Float::with_val(ENUM_PRECISION, bigint_to_rug(x))
}

fn fmul(a: &rug::Float, b: &rug::Float) -> rug::Float {
    rug::Float::with_val(ENUM_PRECISION, a * b)
}

fn fadd(a: &rug::Float, b: &rug::Float) -> rug::Float {
    rug::Float::with_val(ENUM_PRECISION, a + b)
}

fn fsub(a: &rug::Float, b: &rug::Float) -> rug::Float {
    rug::Float::with_val(ENUM_PRECISION, a - b)
}

fn fnorm2(u: &[rug::Float; 2]) -> rug::Float {
    fadd(&fmul(&u[0], &u[0]), &fmul(&u[1], &u[1]))
}

fn pow2_float(exponent: u32) -> rug::Float {
    rug::Float::with_val(ENUM_PRECISION, rug::Float::i_exp(1, exponent as i32))
}

fn float_round_to_int(x: &rug::Float) -> BigInt {
    let rounded = rug::Float::with_val(ENUM_PRECISION, x.round_ref());
    rug_to_bigint(&rounded.to_integer().unwrap_or_else(rug::Integer::new))
}

fn float_floor_to_int(x: &rug::Float) -> BigInt {
    let floored = rug::Float::with_val(ENUM_PRECISION, x.floor_ref());
    rug_to_bigint(&floored.to_integer().unwrap_or_else(rug::Integer::new))
}

/// Lifts a frequency j to candidates for r_tilde by enumerating the
/// two-dimensional lattice spanned by (j, 1/2) and (2^(m+l), 0) inside a
/// ball of radius 2^(m - 1/2) around the origin, verifying each candidate
/// against g^e as it is found.
///
/// Unlike the continued-fraction and shortest-vector lifts, every candidate
/// recorded in the state has already passed the verification that
/// e * r_tilde is a positive multiple of the order. Returns whether any
/// candidate passed for this j, together with the row multiples that
/// reduced this offset's basis.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_for_r_tilde_lattice_enumerate<G: CyclicGroupElement>(
    j: &BigInt,
    m: u32,
    l: u32,
    g_pow_e: &G,
    e: &BigInt,
    accept_multiple: bool,
    state: &mut CandidateSearchState,
    multiples: Option<&IntMatrix>,
    timeout: &Timeout,
) -> Result<(bool, IntMatrix)> {
    if l > m || m == 0 {
        return Err(Error::domain("the parameters must satisfy 0 <= l <= m with m positive"));
    }

    timeout.check()?;

    let delta = m - l;

    // The basis for the lattice, scaled by a factor of two.
    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;
    let a: IntMatrix = vec![
        vec![j * 2, BigInt::one()],
        vec![&pow2ml * 2, BigInt::zero()],
    ];

    let (reduced, multiples) = lagrange(&a, multiples)?;
    let s1 = reduced[0].clone();
    let s2 = reduced[1].clone();

    let s1f = [float_of(&s1[0]), float_of(&s1[1])];
    let s2f = [float_of(&s2[0]), float_of(&s2[1])];

    // mu12 s1 is the component of s2 parallel to s1.
    let mu12 = rug::Float::with_val(
        ENUM_PRECISION,
        fadd(&fmul(&s1f[0], &s2f[0]), &fmul(&s1f[1], &s2f[1])) / fnorm2(&s1f),
    );

    let s2f_orthogonal = [
        fsub(&s2f[0], &fmul(&mu12, &s1f[0])),
        fsub(&s2f[1], &fmul(&mu12, &s1f[1])),
    ];

    // The ball of radius 2^(m - 1/2), squared and scaled by the factor of
    // two baked into the basis: 2^(2m + 1).
    let radius2 = pow2_float(2 * m + 1);
    let pow2mf = pow2_float(m);
    let neg_pow2mf = -pow2mf.clone();

    let mut success = false;

    // Tests one candidate; x^s1[1] and x^s2[1] are computed once and each
    // candidate costs two small powers and a product.
    let mut x_basis: Option<(G, G)> = None;
    let mut test_candidate =
        |i1: &BigInt, i2: &BigInt, state: &mut CandidateSearchState| -> bool {
            let r_tilde_candidate = (i1 * &s1[1] + i2 * &s2[1]).abs();

            if !is_valid_r_tilde(&r_tilde_candidate, m) {
                return false;
            }
            if state.filtered.contains(&r_tilde_candidate) {
                return true;
            }

            let reduced_candidate = r_tilde_candidate.gcd(&state.mu);
            if state.dismissed.contains(&reduced_candidate) {
                trace!("dismissing candidate {}", r_tilde_candidate);
                return false;
            }

            let basis = x_basis.get_or_insert_with(|| (g_pow_e.pow(&s1[1]), g_pow_e.pow(&s2[1])));
            let z = basis.0.pow(i1).multiply(&basis.1.pow(i2));

            if z.is_identity() {
                state.filtered.add(r_tilde_candidate);
                // reduced * e is a multiple of r.
                state.mu = (reduced_candidate * e).gcd(&state.mu);
                true
            } else {
                state.dismissed.insert(reduced_candidate);
                false
            }
        };

    if fnorm2(&s2f_orthogonal) >= radius2 {
        // The component of s2 orthogonal to s1 already exceeds the radius,
        // so the second coordinate of s1 is r_tilde up to sign.
        if test_candidate(&BigInt::one(), &BigInt::zero(), state) {
            success = true;
        }
        return Ok((success, multiples));
    }

    // Upper bound on the number of points inside the ball.
    let bound = 6.0 * 3.0f64.sqrt() * 2.0f64.powi(delta.min(62) as i32);
    let mut count = 0.0f64;

    let admissible = |uf: &[rug::Float; 2]| -> bool {
        let fits = |x: &rug::Float| {
            let magnitude = rug::Float::with_val(ENUM_PRECISION, x.abs_ref());
            !magnitude.is_zero() && magnitude < pow2mf
        };
        fits(&uf[0]) && fits(&uf[1])
    };

    let mut i2 = BigInt::zero();

    loop {
        timeout.check()?;

        let i2f = float_of(&i2);
        let u2_orthogonal = [
            fmul(&i2f, &s2f_orthogonal[0]),
            fmul(&i2f, &s2f_orthogonal[1]),
        ];
        if fnorm2(&u2_orthogonal) > radius2 {
            break;
        }

        let u2f = [fmul(&i2f, &s2f[0]), fmul(&i2f, &s2f[1])];

        // i1hat is the centre of the admissible interval in i1; walk up from
        // it, then down from just below it.
        let i1hat = float_round_to_int(&-fmul(&mu12, &i2f));

        for direction in [1i64, -1] {
            let mut i1 = if direction == 1 { i1hat.clone() } else { &i1hat - 1 };

            // Jump over the leading region where the second coordinate lies
            // outside the admissible strip; every point there fails the
            // bound, and stepping through it one unit at a time would burn
            // the point-count budget.
            if !s1f[1].is_zero() {
                let i1f = float_of(&i1);
                let u1 = fadd(&u2f[1], &fmul(&i1f, &s1f[1]));

                let steps = if s1f[1].is_sign_positive() {
                    if u1 <= neg_pow2mf {
                        let gap = fsub(&-u1, &pow2mf);
                        Some(float_floor_to_int(&rug::Float::with_val(
                            ENUM_PRECISION,
                            gap / &s1f[1],
                        )))
                    } else {
                        None
                    }
                } else if u1 >= pow2mf {
                    let gap = fsub(&u1, &pow2mf);
                    let neg_slope = -s1f[1].clone();
                    Some(float_floor_to_int(&rug::Float::with_val(
                        ENUM_PRECISION,
                        gap / &neg_slope,
                    )))
                } else {
                    None
                };

                if let Some(steps) = steps {
                    if direction == 1 {
                        i1 += steps;
                    } else {
                        i1 -= steps;
                    }
                }
            }

            loop {
                timeout.check()?;

                let i1f = float_of(&i1);
                let uf = [
                    fadd(&u2f[0], &fmul(&i1f, &s1f[0])),
                    fadd(&u2f[1], &fmul(&i1f, &s1f[1])),
                ];

                if fnorm2(&uf) > radius2 {
                    break;
                }

                // Points come in ± pairs; only i2 >= 0 is walked.
                count += if i2.is_zero() { 1.0 } else { 2.0 };

                if !(i1.is_zero() && i2.is_zero()) && admissible(&uf) {
                    if test_candidate(&i1, &i2, state) {
                        success = true;
                        if accept_multiple {
                            return Ok((success, multiples));
                        }
                    }
                }

                // Once a coordinate has left the admissible strip in the
                // walk direction there is no point in continuing. A zero
                // slope counts as moving up in both directions.
                let moving_up = |slope: &rug::Float| {
                    if direction == 1 {
                        !slope.is_sign_negative() || slope.is_zero()
                    } else {
                        slope.is_sign_negative() || slope.is_zero()
                    }
                };
                let out_of_strip = |component: usize| {
                    if moving_up(&s1f[component]) {
                        uf[component] >= pow2mf
                    } else {
                        uf[component] <= neg_pow2mf
                    }
                };
                if out_of_strip(0) || out_of_strip(1) {
                    break;
                }

                if direction == 1 {
                    i1 += 1;
                } else {
                    i1 -= 1;
                }
            }
        }

        i2 += 1;

        // With the jump-ahead in place the walk never visits more points
        // than the ball can hold; exceeding the bound means the enumeration
        // itself went wrong.
        if count >= bound {
            return Err(Error::domain("enumerated more lattice vectors than expected"));
        }
    }

    Ok((success, multiples))
}

/// Attempts to compute the order r of g, or a positive integer multiple of
/// it, from a frequency j yielded by the quantum order-finding circuit.
///
/// Offsets j, j + 1, j - 1, .. out to j ± B are lifted to candidates for
/// r_tilde with the chosen method; each verified candidate is completed to
/// the order through its missing cm-smooth factor. With `isolate_peak`, the
/// scan stops once offsets on both flanks of the peak have failed; with
/// `accept_multiple`, the first verified candidate is completed to a
/// multiple of r and returned immediately.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_for_r<G: CyclicGroupElement>(
    j: &BigInt,
    m: u32,
    l: u32,
    g: &G,
    c: u64,
    b: u64,
    accept_multiple: bool,
    method: SolutionMethods,
    isolate_peak: bool,
    speculative: bool,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;

    if j.is_negative() || j >= &pow2ml {
        return Err(Error::domain("the frequency j must lie on [0, 2^(m + l))"));
    }

    let complete_order = |r_tilde: &BigInt, timeout: &Timeout| -> Result<Option<BigInt>> {
        if speculative {
            recover_order_speculative(g, r_tilde, m, c, timeout)
        } else {
            recover_order_binary(g, r_tilde, m, c, timeout)
        }
    };

    let mut state = CandidateSearchState::new();

    // Pre-compute e and g^e; every candidate check is then one power of gp.
    let e = prime_power_product(c * m as u64);
    let gp = g.pow(&e);

    if gp.is_identity() {
        // The order itself is cm-smooth.
        return complete_order(&BigInt::one(), timeout);
    }

    let half: BigInt = &pow2ml / 2;
    let b = if BigInt::from(b) > half {
        u64::try_from(&half).unwrap_or(u64::MAX)
    } else {
        b
    };

    let mut left: Option<i64> = None;
    let mut right: Option<i64> = None;
    let mut skip_left = false;
    let mut skip_right = false;

    let mut positive_multiples: Option<IntMatrix> = None;
    let mut negative_multiples: Option<IntMatrix> = None;

    for offset in 0..=b {
        timeout.check()?;

        if skip_left && skip_right {
            break;
        }

        trace!("solve_j_for_r: trying offset {} of {}", offset, b);

        for sign in [1i64, -1] {
            if offset == 0 && sign == -1 {
                continue;
            }

            let signed_offset = sign * offset as i64;

            if isolate_peak {
                if let (Some(left_edge), Some(right_edge)) = (left, right) {
                    if sign == 1 && signed_offset > right_edge + 1 {
                        skip_right = true;
                        continue;
                    }
                    if sign == -1 && signed_offset < left_edge - 1 {
                        skip_left = true;
                        continue;
                    }
                }
            }

            let offset_j = (j + BigInt::from(signed_offset)).mod_floor(&pow2ml);

            let seed = if offset == 0 {
                None
            } else if sign == 1 {
                positive_multiples.as_ref()
            } else {
                negative_multiples.as_ref()
            };

            let mut success = false;
            let mut new_multiples: Option<IntMatrix> = None;

            match method {
                SolutionMethods::ContinuedFractions => {
                    if let Some(candidate) =
                        solve_j_for_r_tilde_continued_fractions(&offset_j, m, l)?
                    {
                        if verify_candidate(&gp, &e, &candidate, m, &mut state)? {
                            success = true;
                            if accept_multiple {
                                return recover_multiple_of_r(g, &candidate, m, c, timeout);
                            }
                        }
                    }
                }
                SolutionMethods::LatticeShortestVector => {
                    let (candidate, multiples) =
                        solve_j_for_r_tilde_lattice_svp(&offset_j, m, l, seed)?;
                    new_multiples = Some(multiples);

                    if verify_candidate(&gp, &e, &candidate, m, &mut state)? {
                        success = true;
                        if accept_multiple {
                            return recover_multiple_of_r(g, &candidate, m, c, timeout);
                        }
                    }
                }
                SolutionMethods::LatticeEnumerate => {
                    let (passed, multiples) = solve_j_for_r_tilde_lattice_enumerate(
                        &offset_j,
                        m,
                        l,
                        &gp,
                        &e,
                        accept_multiple,
                        &mut state,
                        seed,
                        timeout,
                    )?;
                    new_multiples = Some(multiples);
                    success = passed;

                    if accept_multiple {
                        if let Some(smallest) = state.filtered.min().cloned() {
                            return recover_multiple_of_r(g, &smallest, m, c, timeout);
                        }
                    }
                }
            }

            if let Some(multiples) = new_multiples {
                if offset == 0 {
                    positive_multiples = Some(multiples.clone());
                    negative_multiples = Some(multiples);
                } else if sign == 1 {
                    positive_multiples = Some(multiples);
                } else {
                    negative_multiples = Some(multiples);
                }
            }

            if isolate_peak && success {
                debug!("solve_j_for_r: offset {} verified a candidate", signed_offset);
                match (left, right) {
                    (None, None) => {
                        left = Some(signed_offset);
                        right = Some(signed_offset);
                    }
                    _ if sign == 1 => right = Some(signed_offset),
                    _ => left = Some(signed_offset),
                }
            }
        }
    }

    if state.filtered.is_empty() {
        return Ok(None);
    }

    // Complete each surviving candidate and keep the least order found.
    let mut best: Option<BigInt> = None;
    let candidates: Vec<BigInt> = state.filtered.iter().cloned().collect();
    for candidate in candidates {
        if let Some(r) = complete_order(&candidate, timeout)? {
            if best.as_ref().map_or(true, |current| &r < current) {
                best = Some(r);
            }
        }
    }

    Ok(best)
}

/// Verifies one candidate for r_tilde against gp = g^e, using the search
/// state to avoid repeated exponentiations. Returns true iff e * r_tilde is
/// a positive multiple of the order.
fn verify_candidate<G: CyclicGroupElement>(
    gp: &G,
    e: &BigInt,
    candidate: &BigInt,
    m: u32,
    state: &mut CandidateSearchState,
) -> Result<bool> {
    if !is_valid_r_tilde(candidate, m) {
        return Ok(false);
    }

    if state.filtered.contains(candidate) {
        return Ok(true);
    }

    let reduced = candidate.gcd(&state.mu);

    if reduced.is_one() || state.dismissed.contains(&reduced) {
        trace!("dismissing candidate {}", candidate);
        return Ok(false);
    }

    if gp.pow(&reduced).is_identity() {
        state.filtered.add(candidate.clone());
        state.mu = (reduced * e).gcd(&state.mu);
        Ok(true)
    } else {
        state.dismissed.insert(reduced);
        Ok(false)
    }
}

/// Convenience wrapper: solves j for the order of g modulo n.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_for_r_mod_n(
    j: &BigInt,
    m: u32,
    l: u32,
    g: &BigInt,
    n: &BigInt,
    c: u64,
    b: u64,
    accept_multiple: bool,
    method: SolutionMethods,
    isolate_peak: bool,
    speculative: bool,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    let g = crate::group::IntegerModRingElement::new(g.clone(), n.clone())?;
    solve_j_for_r(
        j,
        m,
        l,
        &g,
        c,
        b,
        accept_multiple,
        method,
        isolate_peak,
        speculative,
        timeout,
    )
}
