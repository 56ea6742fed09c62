// src/linear_algebra/matrix.rs

use num::{BigInt, BigRational, Integer, One, Zero};

use crate::core::error::{Error, Result};
use crate::linear_algebra::vector::{IntVector, RatVector};

pub type IntMatrix = Vec<IntVector>;
pub type RatMatrix = Vec<RatVector>;

/// Returns the dimensions (n, d) of an n x d matrix.
pub fn dimensions<T>(b: &[Vec<T>]) -> (usize, usize) {
    let n = b.len();
    let d = if n == 0 { 0 } else { b[0].len() };
    (n, d)
}

/// Converts an integer matrix to rationals.
pub fn to_rational_matrix(b: &[IntVector]) -> RatMatrix {
    b.iter()
        .map(|row| row.iter().map(|x| BigRational::from_integer(x.clone())).collect())
        .collect()
}

/// Inverts a full-rank rational n x n matrix by exact Gaussian elimination,
/// applying every row operation to an identity copy.
///
/// Fails with `Singular` when the matrix is rank-deficient and with a domain
/// error when it is not square.
pub fn invert(b: &[RatVector]) -> Result<RatMatrix> {
    let (n, d) = dimensions(b);
    if n != d || n == 0 {
        return Err(Error::domain("the matrix to invert must be square and non-empty"));
    }

    let mut work: RatMatrix = b.to_vec();
    let mut inverse: RatMatrix = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { BigRational::one() } else { BigRational::zero() })
                .collect()
        })
        .collect();

    for column in 0..n {
        // Find the first unused row that is non-zero in this column.
        let mut row = column;
        while row < n && work[row][column].is_zero() {
            row += 1;
        }
        if row == n {
            return Err(Error::Singular);
        }

        // Scale the pivot row to one.
        let pivot = work[row][column].clone();
        for j in 0..n {
            work[row][j] /= &pivot;
            inverse[row][j] /= &pivot;
        }

        // Clear the column in every other row.
        for i in 0..n {
            if i == row {
                continue;
            }
            let factor = work[i][column].clone();
            if factor.is_zero() {
                continue;
            }
            for j in 0..n {
                let w = &work[row][j] * &factor;
                work[i][j] -= w;
                let v = &inverse[row][j] * &factor;
                inverse[i][j] -= v;
            }
        }

        if row != column {
            work.swap(row, column);
            inverse.swap(row, column);
        }
    }

    Ok(inverse)
}

/// Solves c B = t for the rational row vector c, given a full-rank square B.
/// The inverse may be passed along to avoid recomputation.
pub fn solve_left(
    b: &[RatVector],
    t: &[BigRational],
    b_inv: Option<&RatMatrix>,
) -> Result<RatVector> {
    let (n, d) = dimensions(b);
    if n != d || n == 0 {
        return Err(Error::domain("solve_left requires a square, non-empty matrix"));
    }
    if t.len() != n {
        return Err(Error::domain("solve_left requires a matching target length"));
    }

    let computed;
    let inverse = match b_inv {
        Some(inverse) => inverse,
        None => {
            computed = invert(b)?;
            &computed
        }
    };

    // c = t B^-1.
    let c = (0..n)
        .map(|j| {
            (0..n)
                .map(|i| &t[i] * &inverse[i][j])
                .fold(BigRational::zero(), |acc, x| acc + x)
        })
        .collect();

    Ok(c)
}

/// Solves c B = o over the integers for a 2 x 2 integer matrix B, returning
/// None when B is singular or when no integer solution exists.
pub fn solve_left_2x2(b: &[IntVector], o: &[BigInt]) -> Option<IntVector> {
    debug_assert_eq!(dimensions(b), (2, 2));
    debug_assert_eq!(o.len(), 2);

    let det = &b[0][0] * &b[1][1] - &b[0][1] * &b[1][0];
    if det.is_zero() {
        return None;
    }

    let first = &b[1][1] * &o[0] - &b[1][0] * &o[1];
    let (c0, remainder) = first.div_rem(&det);
    if !remainder.is_zero() {
        return None;
    }

    let second = -(&b[0][1] * &o[0]) + &b[0][0] * &o[1];
    let (c1, remainder) = second.div_rem(&det);
    if !remainder.is_zero() {
        return None;
    }

    Some(vec![c0, c1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_matrix(rows: &[&[i64]]) -> IntMatrix {
        rows.iter()
            .map(|row| row.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    fn identity(n: usize) -> RatMatrix {
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { BigRational::one() } else { BigRational::zero() })
                    .collect()
            })
            .collect()
    }

    fn multiply(a: &[RatVector], b: &[RatVector]) -> RatMatrix {
        let (n, _) = dimensions(a);
        let (_, d) = dimensions(b);
        (0..n)
            .map(|i| {
                (0..d)
                    .map(|j| {
                        (0..b.len())
                            .map(|k| &a[i][k] * &b[k][j])
                            .fold(BigRational::zero(), |acc, x| acc + x)
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_invert_times_original_is_identity() {
        let b = to_rational_matrix(&int_matrix(&[&[1, 1, 1], &[-1, 0, 2], &[3, 5, 6]]));
        let b_inv = invert(&b).unwrap();
        assert_eq!(multiply(&b_inv, &b), identity(3));
        assert_eq!(multiply(&b, &b_inv), identity(3));
    }

    #[test]
    fn test_invert_singular() {
        let b = to_rational_matrix(&int_matrix(&[&[1, 2], &[2, 4]]));
        assert_eq!(invert(&b), Err(Error::Singular));
    }

    #[test]
    fn test_invert_requires_square() {
        let b = to_rational_matrix(&int_matrix(&[&[1, 2, 3], &[4, 5, 6]]));
        assert!(matches!(invert(&b), Err(Error::Domain(_))));
    }

    #[test]
    fn test_solve_left() {
        let b = to_rational_matrix(&int_matrix(&[&[2, 1], &[1, 3]]));
        // c = (1, 2) gives t = c B = (4, 7).
        let t = vec![
            BigRational::from_integer(BigInt::from(4)),
            BigRational::from_integer(BigInt::from(7)),
        ];
        let c = solve_left(&b, &t, None).unwrap();
        assert_eq!(c[0], BigRational::from_integer(BigInt::from(1)));
        assert_eq!(c[1], BigRational::from_integer(BigInt::from(2)));
    }

    #[test]
    fn test_solve_left_2x2() {
        let b = int_matrix(&[&[2, 1], &[1, 3]]);
        let o: IntVector = vec![BigInt::from(4), BigInt::from(7)];
        assert_eq!(
            solve_left_2x2(&b, &o),
            Some(vec![BigInt::from(1), BigInt::from(2)])
        );

        // No integer solution for o = (1, 0): c = (3/5, -1/5).
        let o: IntVector = vec![BigInt::from(1), BigInt::from(0)];
        assert_eq!(solve_left_2x2(&b, &o), None);

        // Singular matrix.
        let singular = int_matrix(&[&[1, 2], &[2, 4]]);
        let o: IntVector = vec![BigInt::from(1), BigInt::from(2)];
        assert_eq!(solve_left_2x2(&singular, &o), None);
    }
}
