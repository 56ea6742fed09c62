// src/lattice/babai.rs

use num::{BigInt, BigRational};

use crate::core::error::{Error, Result};
use crate::linear_algebra::gram_schmidt::{GramSchmidt, GramSchmidtData};
use crate::linear_algebra::matrix::{dimensions, IntMatrix};
use crate::linear_algebra::scalar::Scalar;
use crate::linear_algebra::vector::{dot_scalar, norm2_scalar};

/// Babai's nearest plane algorithm.
///
/// Given an n x d delta-LLL-reduced integer basis B with its Gram–Schmidt
/// data and a target t in the rational span of B, returns a lattice vector
/// close to t. Working from row n down to row 1, the projection of the
/// residual onto b_i* is rounded (ties away from zero) and the corresponding
/// multiple of b_i is accumulated.
pub fn babai(b: &IntMatrix, t: &[BigRational], gs: &GramSchmidt) -> Result<Vec<BigInt>> {
    match gs {
        GramSchmidt::Exact(data) => babai_with(b, t, data, ()),
        GramSchmidt::Approx(data) => {
            let precision = data
                .bs
                .first()
                .and_then(|row| row.first())
                .map(|x| x.precision())
                .ok_or_else(|| Error::domain("babai requires a non-empty basis"))?;
            babai_with(b, t, data, precision)
        }
    }
}

pub fn babai_with<T: Scalar>(
    b: &IntMatrix,
    t: &[BigRational],
    gs: &GramSchmidtData<T>,
    ctx: T::Ctx,
) -> Result<Vec<BigInt>> {
    let (n, d) = dimensions(b);
    if n == 0 || d == 0 {
        return Err(Error::domain("babai requires a non-empty basis"));
    }
    if t.len() != d {
        return Err(Error::domain("babai requires a target of matching dimension"));
    }

    let mut residual: Vec<T> = t.iter().map(|x| T::from_rational(x, ctx)).collect();
    let mut result = vec![BigInt::from(0); d];

    for i in (0..n).rev() {
        let numerator = dot_scalar(&residual, &gs.bs[i], ctx);
        let denominator = norm2_scalar(&gs.bs[i], ctx);
        let coefficient = numerator.div(&denominator).round();

        for k in 0..d {
            let step = &coefficient * &b[i][k];
            let subtracted = T::from_int(&step, ctx);
            residual[k] = residual[k].sub(&subtracted);
            result[k] += step;
        }
    }

    Ok(result)
}
