// src/lattice/lll.rs

use log::trace;
use num::{BigInt, BigRational};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::linear_algebra::gram_schmidt::{gram_schmidt, GramSchmidt, GramSchmidtData};
use crate::linear_algebra::matrix::{dimensions, IntMatrix};
use crate::linear_algebra::scalar::{Fp, Scalar};
use crate::linear_algebra::vector::{dot_int_scalar, norm2_scalar};

/// The default delta parameter in the Lovász condition.
pub const DEFAULT_DELTA: f64 = 0.99;

/// Computes a delta-LLL-reduced basis for the n x d integer basis A, together
/// with its Gram–Schmidt data.
///
/// The Gram–Schmidt orthogonalisation is maintained incrementally alongside
/// the reduction. Projection factors are exact quotients, or
/// `Float(precision)` values when a precision is given. The timeout is
/// checked at the head of the main loop and inside size reduction.
pub fn lll(
    a: &IntMatrix,
    delta: f64,
    timeout: &Timeout,
    precision: Option<u32>,
) -> Result<(IntMatrix, GramSchmidt)> {
    if !(delta > 0.25 && delta <= 1.0) {
        return Err(Error::domain("delta must lie on (1/4, 1]"));
    }

    match precision {
        None => {
            let (b, gs) = lll_with::<BigRational>(a, delta, timeout, ())?;
            Ok((b, GramSchmidt::Exact(gs)))
        }
        Some(precision) => {
            let (b, gs) = lll_with::<Fp>(a, delta, timeout, precision)?;
            Ok((b, GramSchmidt::Approx(gs)))
        }
    }
}

fn lll_with<T: Scalar>(
    a: &IntMatrix,
    delta: f64,
    timeout: &Timeout,
    ctx: T::Ctx,
) -> Result<(IntMatrix, GramSchmidtData<T>)> {
    timeout.check()?;

    let (n, d) = dimensions(a);
    if n == 0 || d == 0 {
        return Err(Error::domain("lll requires a non-empty basis matrix"));
    }

    let delta = T::from_f64(delta, ctx);

    let mut b: IntMatrix = a.to_vec();

    let mut bs: Vec<Vec<T>> = vec![vec![T::zero(ctx); d]; n];
    let mut mu: Vec<Vec<T>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        T::from_int(&BigInt::from(1), ctx)
                    } else {
                        T::zero(ctx)
                    }
                })
                .collect()
        })
        .collect();

    // b_1* = b_1.
    bs[0] = b[0].iter().map(|x| T::from_int(x, ctx)).collect();

    let mut i = 2usize;

    while i <= n {
        timeout.check()?;

        // Size-reduce row i against rows i-1, .., 1, rebuilding b_i*.
        for k in 0..d {
            bs[i - 1][k] = T::zero(ctx);
        }

        for j in (1..i).rev() {
            timeout.check()?;

            let numerator = dot_int_scalar(&b[i - 1], &bs[j - 1], ctx);
            let denominator = norm2_scalar(&bs[j - 1], ctx);
            mu[i - 1][j - 1] = numerator.div(&denominator);

            if mu[i - 1][j - 1].exceeds_half() {
                let rounded = mu[i - 1][j - 1].round();

                for k in 0..d {
                    let subtracted = &rounded * &b[j - 1][k];
                    b[i - 1][k] -= subtracted;
                }

                let adjusted = T::from_int(&rounded, ctx);
                mu[i - 1][j - 1] = mu[i - 1][j - 1].sub(&adjusted);
            }

            for k in 0..d {
                let projected = mu[i - 1][j - 1].mul(&bs[j - 1][k]);
                bs[i - 1][k] = bs[i - 1][k].sub(&projected);
            }
        }

        for k in 0..d {
            let entry = T::from_int(&b[i - 1][k], ctx);
            bs[i - 1][k] = bs[i - 1][k].add(&entry);
        }

        // Lovász condition for b_{i-1}* and b_i*.
        let factor = delta.sub(&mu[i - 1][i - 2].mul(&mu[i - 1][i - 2]));
        let lhs = factor.mul(&norm2_scalar(&bs[i - 2], ctx));
        let rhs = norm2_scalar(&bs[i - 1], ctx);

        if lhs <= rhs {
            i += 1;
        } else {
            trace!("lll: swapping rows {} and {}", i - 1, i);
            b.swap(i - 2, i - 1);

            if i == 2 {
                bs[0] = b[0].iter().map(|x| T::from_int(x, ctx)).collect();
            } else {
                i -= 1;
            }
        }
    }

    Ok((b, GramSchmidtData { bs, mu }))
}

/// Checks if the n x d integer basis B is delta-LLL-reduced: size reduction
/// |mu_ij| <= 1/2 for j < i, and the Lovász condition
/// delta ||b_{i}*||^2 <= ||b_{i+1}*||^2 + mu_{i+1,i}^2 ||b_{i}*||^2.
pub fn is_lll_reduced(b: &IntMatrix, delta: f64, gs: Option<&GramSchmidt>, precision: Option<u32>) -> bool {
    let computed;
    let gs = match gs {
        Some(gs) => gs,
        None => {
            computed = gram_schmidt(b, precision);
            &computed
        }
    };

    match gs {
        GramSchmidt::Exact(data) => is_lll_reduced_with(b, delta, data, ()),
        GramSchmidt::Approx(data) => {
            let precision = data
                .mu
                .first()
                .and_then(|row| row.first())
                .map(|x| x.precision())
                .unwrap_or(crate::linear_algebra::gram_schmidt::DEFAULT_REDUCED_PRECISION);
            is_lll_reduced_with(b, delta, data, precision)
        }
    }
}

fn is_lll_reduced_with<T: Scalar>(
    b: &IntMatrix,
    delta: f64,
    gs: &GramSchmidtData<T>,
    ctx: T::Ctx,
) -> bool {
    let (n, _) = dimensions(b);
    let delta = T::from_f64(delta, ctx);

    for i in 1..n {
        for j in 0..i {
            if gs.mu[i][j].exceeds_half() {
                return false;
            }
        }
    }

    for i in 0..n.saturating_sub(1) {
        let prev_norm2 = norm2_scalar(&gs.bs[i], ctx);
        let lhs = delta.mul(&prev_norm2);
        let mu2 = gs.mu[i + 1][i].mul(&gs.mu[i + 1][i]);
        let rhs = norm2_scalar(&gs.bs[i + 1], ctx).add(&mu2.mul(&prev_norm2));
        if lhs > rhs {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear_algebra::vector::norm2;

    fn int_matrix(rows: &[&[i64]]) -> IntMatrix {
        rows.iter()
            .map(|row| row.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    #[test]
    fn test_reduces_three_dimensional_basis() {
        let a = int_matrix(&[&[1, 1, 1], &[-1, 0, 2], &[3, 5, 6]]);
        let (b, gs) = lll(&a, 0.99, &Timeout::indefinite(), None).unwrap();

        assert!(is_lll_reduced(&b, 0.99, Some(&gs), None));

        // The first reduced vector obeys the LLL approximation bound
        // ||b_1||^2 <= 2^(n-1) lambda_1^2; for this classic example the
        // shortest vector has squared norm 1.
        assert!(norm2(&b[0]) <= BigInt::from(4));
    }

    #[test]
    fn test_reduction_preserves_row_span() {
        use crate::linear_algebra::matrix::{invert, solve_left, to_rational_matrix};

        let a = int_matrix(&[&[1, 1, 1], &[-1, 0, 2], &[3, 5, 6]]);
        let (b, _) = lll(&a, 0.99, &Timeout::indefinite(), None).unwrap();

        // Every reduced row is an integer combination of the input rows and
        // vice versa.
        let a_rational = to_rational_matrix(&a);
        let b_rational = to_rational_matrix(&b);
        let a_inv = invert(&a_rational).unwrap();
        let b_inv = invert(&b_rational).unwrap();

        for row in &b_rational {
            let c = solve_left(&a_rational, row, Some(&a_inv)).unwrap();
            assert!(c.iter().all(|x| x.is_integer()));
        }
        for row in &a_rational {
            let c = solve_left(&b_rational, row, Some(&b_inv)).unwrap();
            assert!(c.iter().all(|x| x.is_integer()));
        }
    }

    #[test]
    fn test_two_dimensional_agrees_with_lagrange() {
        use crate::lattice::lagrange::{is_lagrange_reduced, lagrange};

        let a = int_matrix(&[&[201, 37], &[1648, 297]]);
        let (b, _) = lll(&a, 1.0, &Timeout::indefinite(), None).unwrap();
        let (reduced, _) = lagrange(&a, None).unwrap();

        // Both produce a shortest first vector of the same length.
        assert!(is_lagrange_reduced(&reduced));
        assert_eq!(norm2(&b[0]), norm2(&reduced[0]));
    }

    #[test]
    fn test_approximate_projection_factors() {
        let a = int_matrix(&[&[1, 1, 1], &[-1, 0, 2], &[3, 5, 6]]);
        let (b, gs) = lll(&a, 0.99, &Timeout::indefinite(), Some(128)).unwrap();
        assert!(matches!(gs, GramSchmidt::Approx(_)));
        assert!(is_lll_reduced(&b, 0.99, None, None));
    }

    #[test]
    fn test_rejects_bad_delta() {
        let a = int_matrix(&[&[1, 0], &[0, 1]]);
        assert!(lll(&a, 0.25, &Timeout::indefinite(), None).is_err());
        assert!(lll(&a, 1.5, &Timeout::indefinite(), None).is_err());
    }

    #[test]
    fn test_identity_is_already_reduced() {
        let a = int_matrix(&[&[1, 0, 0], &[0, 1, 0], &[0, 0, 1]]);
        let (b, _) = lll(&a, 0.99, &Timeout::indefinite(), None).unwrap();
        assert_eq!(b, a);
    }
}
