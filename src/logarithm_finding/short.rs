// src/logarithm_finding/short.rs

use std::collections::HashMap;

use log::{debug, trace};
use num::integer::Roots;
use num::{BigInt, BigRational, Integer, One, Signed, Zero};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::group::CyclicGroupElement;
use crate::integer_math::modular::truncmod;
use crate::lattice::babai::babai;
use crate::lattice::enumerate::{enumerate, solve_cvp};
use crate::lattice::lagrange::lagrange;
use crate::lattice::lll::lll;
use crate::linear_algebra::matrix::{solve_left_2x2, IntMatrix};
use crate::linear_algebra::vector::{norm2, to_rational};
use crate::logarithm_finding::EnumerationOptions;

/// Computes the vector u in the lattice L^tau(j) that encodes the logarithm
/// d for the frequency pair (j, k): the difference against the target
/// v = (truncmod(-2^m k, 2^(m+l)), 0) is
/// (truncmod(d j - 2^m k, 2^(m+l)), 2^tau d).
pub fn expected_u_for_j_k_d(
    j: &BigInt,
    k: &BigInt,
    m: u32,
    l: u32,
    d: &BigInt,
    tau: u32,
) -> Result<Vec<BigInt>> {
    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;
    let pow2m: BigInt = BigInt::one() << m as usize;

    let v0 = truncmod(&(-(&pow2m * k)), &pow2ml)?;

    let t1 = d * j - &v0;
    let t2 = truncmod(&t1, &pow2ml)?;
    let mp = (&t1 - &t2) / &pow2ml;

    Ok(vec![d * j - &pow2ml * mp, (BigInt::one() << tau as usize) * d])
}

/// Attempts to compute a short discrete logarithm d from a single frequency
/// pair (j, k) yielded by the quantum circuit, given g and x = g^d.
///
/// The pair spans the lattice L^tau(j) generated by (j, 2^tau) and
/// (2^(m+l), 0); the target is v = (truncmod(-2^m k, 2^(m+l)), 0). After
/// Lagrange reduction, the vector closest to v is refined by a
/// meet-in-the-middle walk over the plane: a baby-step table of hashed group
/// elements makes the enumeration run in roughly the square root of the
/// number of candidate points. When t is absent, the smallest t for which
/// the lattice is t-balanced is used; when t is given and the lattice is not
/// t-balanced, the solver returns None.
#[allow(clippy::too_many_arguments)]
pub fn solve_j_k_for_d<G: CyclicGroupElement>(
    j: &BigInt,
    k: &BigInt,
    m: u32,
    l: u32,
    g: &G,
    x: &G,
    tau: u32,
    t: Option<u32>,
    c: u64,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    if l == 0 || l > m {
        return Err(Error::domain("l must lie on (0, m]"));
    }
    if tau > l {
        return Err(Error::domain("tau must lie on [0, l]"));
    }
    if let Some(t) = t {
        if t >= m {
            return Err(Error::domain("t must lie on [0, m)"));
        }
    }
    if c == 0 {
        return Err(Error::domain("c must be a positive integer"));
    }

    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;
    let pow2l: BigInt = BigInt::one() << l as usize;
    if j.is_negative() || j >= &pow2ml {
        return Err(Error::domain("the frequency j must lie on [0, 2^(m + l))"));
    }
    if k.is_negative() || k >= &pow2l {
        return Err(Error::domain("the frequency k must lie on [0, 2^l)"));
    }

    let pow2tau: BigInt = BigInt::one() << tau as usize;
    let pow2m: BigInt = BigInt::one() << m as usize;

    // The lattice L^tau(j).
    let a: IntMatrix = vec![
        vec![j.clone(), pow2tau.clone()],
        vec![pow2ml.clone(), BigInt::zero()],
    ];
    let (b, _) = lagrange(&a, None)?;

    let s1 = b[0].clone();
    let s2 = b[1].clone();

    let s1_norm2 = norm2(&s1);

    // t-balance: lambda_1 >= 2^(m - t).
    let is_t_balanced = |t: u32| -> bool {
        let shifted = &s1_norm2 << (2 * t) as usize;
        shifted >= BigInt::one() << (2 * m) as usize
    };

    let t = match t {
        Some(t) => {
            if !is_t_balanced(t) {
                debug!("solve_j_k_for_d: the lattice is not {}-balanced", t);
                return Ok(None);
            }
            t
        }
        None => match (0..m).find(|&t| is_t_balanced(t)) {
            Some(t) => t,
            None => return Ok(None),
        },
    };
    trace!("solve_j_k_for_d: using t = {}", t);

    // The target vector v and the closest lattice vector o = nu_1 s1 +
    // nu_2 s2.
    let v0 = truncmod(&(-(&pow2m * k)), &pow2ml)?;
    let v = vec![v0, BigInt::zero()];

    let gs = crate::linear_algebra::gram_schmidt::gram_schmidt(&b, None);
    let o = babai(&b, &to_rational(&v), &gs)?;

    let nu = solve_left_2x2(&b, &o)
        .ok_or_else(|| Error::domain("failed to solve for the closest vector coefficients"))?;

    // Search bounds: B_i = round(sqrt(2) 2^(m + tau) / lambda_i), with
    // lambda_2 taken orthogonally to s1. The determinant identity
    // lambda_2_perp^2 = det^2 / ||s1||^2 with det = 2^(m + l + tau) turns
    // both into integer square roots.
    let b1: BigInt = ((BigInt::one() << (2 * (m + tau) + 1) as usize) / &s1_norm2).sqrt() + 1;
    let b2: BigInt = ((&s1_norm2 * 2u32) >> (2 * l) as usize).sqrt() + 1;

    // The scalars such that a lattice vector's second coordinate, divided by
    // 2^tau, steps by s1_scalar and s2_scalar.
    let (s1_scalar, remainder) = s1[1].div_rem(&pow2tau);
    debug_assert!(remainder.is_zero());
    let (s2_scalar, remainder) = s2[1].div_rem(&pow2tau);
    debug_assert!(remainder.is_zero());

    debug!("solve_j_k_for_d: meet in the middle with B1 = {}, B2 = {}", b1, b2);

    meet_in_the_middle(
        g,
        x,
        &nu[0],
        &nu[1],
        &b1,
        &b2,
        &s1_scalar,
        &s2_scalar,
        c,
        m,
        timeout,
    )
}

/// The meet-in-the-middle walk over the plane spanned by the reduced basis
/// scalars: candidate logarithms d = (nu_1 + i - k n) s_1 + (nu_2 ± j) s_2
/// are matched through a baby-step table of hashed group elements.
#[allow(clippy::too_many_arguments)]
fn meet_in_the_middle<G: CyclicGroupElement>(
    g: &G,
    x: &G,
    nu1: &BigInt,
    nu2: &BigInt,
    b1: &BigInt,
    b2: &BigInt,
    s1: &BigInt,
    s2: &BigInt,
    c: u64,
    m: u32,
    timeout: &Timeout,
) -> Result<Option<BigInt>> {
    // Keep the wider direction first.
    if b1 < b2 {
        return meet_in_the_middle(g, x, nu2, nu1, b2, b1, s2, s1, c, m, timeout);
    }

    let pow2m: BigInt = BigInt::one() << m as usize;

    let accept = |d: &BigInt| -> Option<BigInt> {
        if !d.is_negative() && d < &pow2m && g.pow(d) == *x {
            Some(d.clone())
        } else {
            None
        }
    };

    let g1 = g.pow(s1);
    let g2 = g.pow(s2);
    let w = g1.pow(nu1).multiply(&g2.pow(nu2)).multiply(&x.inverse());

    if b1.is_zero() {
        if w.is_identity() {
            let d = nu1 * s1 + nu2 * s2;
            return Ok(accept(&d));
        }
        return Ok(None);
    }

    let n: BigInt = {
        let steps = (b1 / (b2 + BigInt::one())).sqrt() * c;
        if steps.is_positive() { steps } else { BigInt::one() }
    };

    // Stage one: the baby-step table of powers of g1^n.
    let mut table: HashMap<G, BigInt> = HashMap::new();
    table.insert(g.identity(), BigInt::zero());

    let s = g1.pow(&n);
    let s_inv = s.inverse();
    let mut z_plus = s.clone();
    let mut z_minus = s_inv.clone();
    let giant_steps = b1.div_ceil(&n);

    let mut i = BigInt::one();
    loop {
        timeout.check()?;

        table.insert(z_plus.clone(), i.clone());
        table.insert(z_minus.clone(), -(&i));

        i += 1;
        if i > giant_steps {
            break;
        }

        z_plus = z_plus.multiply(&s);
        z_minus = z_minus.multiply(&s_inv);
    }

    // Stage two: walk w across the table.
    let g2_inv = g2.inverse();
    let mut z_plus = w.clone();
    let mut z_minus = w;
    let mut offset2 = BigInt::zero();

    loop {
        timeout.check()?;

        let mut zp_plus = z_plus.clone();
        let mut zp_minus = z_minus.clone();
        let mut offset1 = BigInt::zero();

        loop {
            if let Some(steps) = table.get(&zp_plus) {
                let d = (nu1 + &offset1 - steps * &n) * s1 + (nu2 + &offset2) * s2;
                if let Some(d) = accept(&d) {
                    return Ok(Some(d));
                }
            }

            if offset2.is_positive() {
                if let Some(steps) = table.get(&zp_minus) {
                    let d = (nu1 + &offset1 - steps * &n) * s1 + (nu2 - &offset2) * s2;
                    if let Some(d) = accept(&d) {
                        return Ok(Some(d));
                    }
                }
            }

            offset1 += 1;
            if offset1 >= n {
                break;
            }

            zp_plus = zp_plus.multiply(&g1);
            zp_minus = zp_minus.multiply(&g1);
        }

        offset2 += 1;
        if &offset2 > b2 {
            break;
        }

        z_plus = z_plus.multiply(&g2);
        z_minus = z_minus.multiply(&g2_inv);
    }

    Ok(None)
}

/// Attempts to compute a short discrete logarithm d from n frequency pairs
/// (j_i, k_i), given g and x = g^d.
///
/// The pairs span the (n+1)-dimensional lattice with rows
/// b_0 = (j_1, .., j_n, 2^tau) and b_i = 2^(m+l) e_i; the target is
/// v = (truncmod(-2^m k_1, 2^(m+l)), .., truncmod(-2^m k_n, 2^(m+l)), 0).
/// The vector u = d b_0 - sum m_i b_i closest to v carries 2^tau d in its
/// last coordinate. The basis is delta-LLL-reduced at the given precision
/// and searched per the enumeration option; every candidate d is verified
/// against x = g^d.
#[allow(clippy::too_many_arguments)]
pub fn solve_multiple_j_k_for_d<G: CyclicGroupElement>(
    j_k_list: &[(BigInt, BigInt)],
    m: u32,
    l: u32,
    g: &G,
    x: &G,
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

    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;
    let pow2l: BigInt = BigInt::one() << l as usize;
    let pow2m: BigInt = BigInt::one() << m as usize;
    let pow2tau: BigInt = BigInt::one() << tau as usize;

    for (j, k) in j_k_list {
        if j.is_negative() || j >= &pow2ml {
            return Err(Error::domain("every frequency j must lie on [0, 2^(m + l))"));
        }
        if k.is_negative() || k >= &pow2l {
            return Err(Error::domain("every frequency k must lie on [0, 2^l)"));
        }
    }

    // Rows: (j_1, .., j_n, 2^tau) and the modulus rows 2^(m+l) e_i.
    let mut basis: IntMatrix = Vec::with_capacity(n + 1);
    let mut first_row: Vec<BigInt> = j_k_list.iter().map(|(j, _)| j.clone()).collect();
    first_row.push(pow2tau.clone());
    basis.push(first_row);
    for i in 0..n {
        let mut row = vec![BigInt::zero(); n + 1];
        row[i] = pow2ml.clone();
        basis.push(row);
    }

    let (reduced, gs) = lll(&basis, delta, timeout, precision)?;

    // The target vector.
    let mut v: Vec<BigInt> = Vec::with_capacity(n + 1);
    for (_, k) in j_k_list {
        v.push(truncmod(&(-(&pow2m * k)), &pow2ml)?);
    }
    v.push(BigInt::zero());
    let v_rational = to_rational(&v);

    // Derives d from a candidate lattice vector u and verifies it.
    let derive = |u: &[BigInt]| -> Option<BigInt> {
        let difference = &u[n] - &v[n];
        let (d, remainder) = difference.div_rem(&pow2tau);
        if !remainder.is_zero() || d.is_negative() || d >= pow2m {
            return None;
        }
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
            // Radius sqrt(n+1) 2^(m+tau): each tau-good pair contributes a
            // coordinate of magnitude at most 2^(m+tau), as does 2^tau d.
            let radius2 = BigRational::from_integer(
                BigInt::from(n as u64 + 1) * (BigInt::one() << (2 * (m + tau)) as usize),
            );

            let found = enumerate(&reduced, &radius2, Some(&v_rational), &gs, timeout)?;
            debug!(
                "solve_multiple_j_k_for_d: enumerated {} lattice points",
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
