// src/linear_algebra/gram_schmidt.rs

use num::{BigInt, BigRational};

use crate::linear_algebra::matrix::{dimensions, IntMatrix};
use crate::linear_algebra::scalar::{Fp, Scalar};
use crate::linear_algebra::vector::{dot_int_scalar, norm2_scalar};

/// The precision used for reduced Gram–Schmidt data when the caller asks for
/// an approximate representation without specifying one.
pub const DEFAULT_REDUCED_PRECISION: u32 = 128;

/// The orthogonalised rows Bs and the lower-triangular projection factor
/// matrix M of a basis B, with B = M Bs and unit diagonal in M.
#[derive(Debug, Clone)]
pub struct GramSchmidtData<T: Scalar> {
    pub bs: Vec<Vec<T>>,
    pub mu: Vec<Vec<T>>,
}

/// Gram–Schmidt data at either exact or fixed precision, as selected by the
/// caller.
#[derive(Debug, Clone)]
pub enum GramSchmidt {
    Exact(GramSchmidtData<BigRational>),
    Approx(GramSchmidtData<Fp>),
}

/// Orthogonalises the rows of B.
///
/// The projection factors mu_ij = <b_i, b_j*> / ||b_j*||^2 are exact
/// quotients, or `Float(precision)` values when a precision is given.
pub fn gram_schmidt(b: &IntMatrix, precision: Option<u32>) -> GramSchmidt {
    match precision {
        None => GramSchmidt::Exact(gram_schmidt_with::<BigRational>(b, ())),
        Some(precision) => GramSchmidt::Approx(gram_schmidt_with::<Fp>(b, precision)),
    }
}

pub fn gram_schmidt_exact(b: &IntMatrix) -> GramSchmidtData<BigRational> {
    gram_schmidt_with::<BigRational>(b, ())
}

pub fn gram_schmidt_with<T: Scalar>(b: &IntMatrix, ctx: T::Ctx) -> GramSchmidtData<T> {
    let (n, d) = dimensions(b);

    let mut bs: Vec<Vec<T>> = b
        .iter()
        .map(|row| row.iter().map(|x| T::from_int(x, ctx)).collect())
        .collect();

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

    for i in 1..n {
        for j in (0..i).rev() {
            // mu_ij = <b_i, b_j*> / ||b_j*||^2 against the already
            // orthogonalised row j.
            let numerator = dot_int_scalar(&b[i], &bs[j], ctx);
            let denominator = norm2_scalar(&bs[j], ctx);
            let factor = numerator.div(&denominator);

            for k in 0..d {
                let projected = factor.mul(&bs[j][k]);
                bs[i][k] = bs[i][k].sub(&projected);
            }

            mu[i][j] = factor;
        }
    }

    GramSchmidtData { bs, mu }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear_algebra::vector::dot_scalar;
    use num::Zero;

    fn int_matrix(rows: &[&[i64]]) -> IntMatrix {
        rows.iter()
            .map(|row| row.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    #[test]
    fn test_exact_orthogonality() {
        let b = int_matrix(&[&[3, 1], &[2, 2]]);
        let data = gram_schmidt_exact(&b);

        // Rows of Bs are pairwise orthogonal.
        let inner = dot_scalar(&data.bs[0], &data.bs[1], ());
        assert!(Zero::is_zero(&inner));

        // B = M Bs reconstructs the first column entry of row two.
        let reconstructed = data.mu[1][0].mul(&data.bs[0][0]).add(&data.bs[1][0]);
        assert_eq!(reconstructed, BigRational::from_integer(BigInt::from(2)));
    }

    #[test]
    fn test_exact_three_rows() {
        let b = int_matrix(&[&[1, 1, 1], &[-1, 0, 2], &[3, 5, 6]]);
        let data = gram_schmidt_exact(&b);

        for i in 0..3 {
            for j in 0..i {
                let inner = dot_scalar(&data.bs[i], &data.bs[j], ());
                assert!(Zero::is_zero(&inner), "rows {} and {} not orthogonal", i, j);
            }
        }

        // M has a unit diagonal.
        for i in 0..3 {
            assert_eq!(data.mu[i][i], BigRational::from_integer(BigInt::from(1)));
        }
    }

    #[test]
    fn test_approximate_matches_exact() {
        let b = int_matrix(&[&[3, 1], &[2, 2]]);
        let exact = gram_schmidt_exact(&b);
        let approx = match gram_schmidt(&b, Some(96)) {
            GramSchmidt::Approx(data) => data,
            GramSchmidt::Exact(_) => unreachable!(),
        };

        // mu_10 = 8/10 exactly; at 96 bits the float value agrees.
        let expected = exact.mu[1][0].clone();
        let got = approx.mu[1][0].to_f64();
        let expected = expected.numer().to_string().parse::<f64>().unwrap()
            / expected.denom().to_string().parse::<f64>().unwrap();
        assert!((got - expected).abs() < 1e-12);
    }
}
