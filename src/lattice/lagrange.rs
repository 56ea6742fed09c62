// src/lattice/lagrange.rs

use num::{BigInt, BigRational, Integer, One, Signed, Zero};

use crate::core::error::{Error, Result};
use crate::linear_algebra::matrix::{dimensions, IntMatrix};
use crate::linear_algebra::vector::{dot, norm2};

/// Lagrange-reduces a 2 x 2 integer basis A.
///
/// Returns (A', U') with A' Lagrange-reduced, A' = U' A and det(U') = ±1.
/// When row multiples U from an earlier, nearby reduction are passed in, the
/// reduction starts from U A, which is typically close to reduced already.
/// The multiples matrix must have full rank.
pub fn lagrange(a: &IntMatrix, multiples: Option<&IntMatrix>) -> Result<(IntMatrix, IntMatrix)> {
    if dimensions(a) != (2, 2) {
        return Err(Error::domain("lagrange requires a 2 x 2 basis matrix"));
    }

    let mut u = a[0].clone();
    let mut v = a[1].clone();

    let (mut u_multiples, mut v_multiples) = match multiples {
        None => (
            vec![BigInt::one(), BigInt::zero()],
            vec![BigInt::zero(), BigInt::one()],
        ),
        Some(m) => {
            if dimensions(m) != (2, 2) {
                return Err(Error::domain("the row multiples must form a 2 x 2 matrix"));
            }
            let det = &m[0][0] * &m[1][1] - &m[0][1] * &m[1][0];
            if det.is_zero() {
                return Err(Error::domain("the row multiples must have full rank"));
            }

            // Start from the combination U A instead of A.
            let started_u = vec![
                &m[0][0] * &u[0] + &m[0][1] * &v[0],
                &m[0][0] * &u[1] + &m[0][1] * &v[1],
            ];
            let started_v = vec![
                &m[1][0] * &u[0] + &m[1][1] * &v[0],
                &m[1][0] * &u[1] + &m[1][1] * &v[1],
            ];
            u = started_u;
            v = started_v;

            (m[0].clone(), m[1].clone())
        }
    };

    let u_norm2 = norm2(&u);
    let mut v_norm2 = norm2(&v);

    if u_norm2 < v_norm2 {
        std::mem::swap(&mut u, &mut v);
        v_norm2 = u_norm2;
        std::mem::swap(&mut u_multiples, &mut v_multiples);
    }

    // Invariant: |v| <= |u|. Shorten u against v, swap, repeat until the
    // shortened vector stops strictly improving on the shorter one.
    loop {
        if v_norm2.is_zero() {
            return Err(Error::domain("lagrange requires a full-rank basis"));
        }

        // q = round(<u, v> / |v|^2), computed with truncated division.
        let projection = dot(&u, &v);
        let (mut q, remainder) = projection.div_rem(&v_norm2);
        if projection.is_negative() {
            if -(&remainder) * 2 >= v_norm2 {
                q -= 1;
            }
        } else if &remainder * 2 >= v_norm2 {
            q += 1;
        }

        let w = vec![&u[0] - &q * &v[0], &u[1] - &q * &v[1]];
        let w_norm2 = norm2(&w);
        let w_multiples = vec![
            &u_multiples[0] - &q * &v_multiples[0],
            &u_multiples[1] - &q * &v_multiples[1],
        ];

        if w_norm2 >= v_norm2 {
            return Ok((vec![v, w], vec![v_multiples, w_multiples]));
        }

        u = std::mem::replace(&mut v, w);
        v_norm2 = w_norm2;
        u_multiples = std::mem::replace(&mut v_multiples, w_multiples);
    }
}

/// Returns true iff the 2 x 2 basis A = [u, v] satisfies |u| <= |v| and
/// |<u, v>| <= |u|^2 / 2.
pub fn is_lagrange_reduced(a: &IntMatrix) -> bool {
    if dimensions(a) != (2, 2) {
        return false;
    }

    let u_norm2 = norm2(&a[0]);
    let v_norm2 = norm2(&a[1]);

    if u_norm2 > v_norm2 || u_norm2.is_zero() {
        return false;
    }

    let abs_mu = BigRational::new(dot(&a[0], &a[1]).abs(), u_norm2);
    abs_mu * BigInt::from(2) <= BigRational::one()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_matrix(rows: &[&[i64]]) -> IntMatrix {
        rows.iter()
            .map(|row| row.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    fn apply(multiples: &IntMatrix, a: &IntMatrix) -> IntMatrix {
        (0..2)
            .map(|i| {
                (0..2)
                    .map(|j| &multiples[i][0] * &a[0][j] + &multiples[i][1] * &a[1][j])
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_reduces_and_tracks_multiples() {
        let a = int_matrix(&[&[201, 37], &[1648, 297]]);
        let (reduced, multiples) = lagrange(&a, None).unwrap();

        assert!(is_lagrange_reduced(&reduced));
        assert_eq!(apply(&multiples, &a), reduced);

        let det = &multiples[0][0] * &multiples[1][1] - &multiples[0][1] * &multiples[1][0];
        assert!(det == BigInt::from(1) || det == BigInt::from(-1));
    }

    #[test]
    fn test_already_reduced_basis_is_fixed() {
        let a = int_matrix(&[&[1, 0], &[0, 1]]);
        let (reduced, _) = lagrange(&a, None).unwrap();
        assert!(is_lagrange_reduced(&reduced));
        assert_eq!(norm2(&reduced[0]), BigInt::from(1));
        assert_eq!(norm2(&reduced[1]), BigInt::from(1));
    }

    #[test]
    fn test_seeded_multiples_agree_with_fresh_reduction() {
        // Reduce for j and reuse the multiples for j + 1.
        let pow = BigInt::from(1) << 20u32;
        let a = int_matrix(&[&[833 * 2, 1], &[0, 0]]);
        let a = vec![a[0].clone(), vec![pow.clone(), BigInt::zero()]];
        let (_, multiples) = lagrange(&a, None).unwrap();

        let b = vec![
            vec![BigInt::from(834 * 2), BigInt::one()],
            vec![pow, BigInt::zero()],
        ];
        let (fresh, _) = lagrange(&b, None).unwrap();
        let (seeded, seeded_multiples) = lagrange(&b, Some(&multiples)).unwrap();

        assert!(is_lagrange_reduced(&seeded));
        assert_eq!(apply(&seeded_multiples, &b), seeded);
        assert_eq!(norm2(&fresh[0]), norm2(&seeded[0]));
    }

    #[test]
    fn test_shortest_vector_of_known_lattice() {
        // The lattice spanned by (1, 1) and (0, 5): shortest vector (1, 1).
        let a = int_matrix(&[&[7, 2], &[4, 6]]);
        let (reduced, _) = lagrange(&a, None).unwrap();
        assert!(is_lagrange_reduced(&reduced));
        assert!(norm2(&reduced[0]) <= norm2(&reduced[1]));
    }

    #[test]
    fn test_rejects_rank_deficient_multiples() {
        let a = int_matrix(&[&[1, 0], &[0, 1]]);
        let singular = int_matrix(&[&[1, 1], &[1, 1]]);
        assert!(lagrange(&a, Some(&singular)).is_err());
    }
}
