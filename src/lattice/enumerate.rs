// src/lattice/enumerate.rs

use num::{BigInt, BigRational, One, Zero};

use crate::core::error::{Error, Result};
use crate::core::timeout::Timeout;
use crate::lattice::babai::babai;
use crate::linear_algebra::gram_schmidt::{GramSchmidt, GramSchmidtData};
use crate::linear_algebra::matrix::{dimensions, solve_left, to_rational_matrix, IntMatrix};
use crate::linear_algebra::scalar::Scalar;
use crate::linear_algebra::vector::{norm2_rational, norm2_scalar, to_rational, IntVector};

/// A lattice vector found by enumeration, together with its integer
/// coordinates in the given basis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedVector {
    pub coordinates: IntVector,
    pub vector: IntVector,
}

/// Enumerates every vector of the lattice spanned by the rows of B within
/// distance sqrt(radius2) of the centre.
///
/// B must be delta-LLL-reduced, square and of full rank; its Gram–Schmidt
/// data drives the depth-n tree walk. At level i the admissible coordinates
/// form an interval around the projection of the remaining target; they are
/// visited zig-zag from the centre outward, and a branch is abandoned as
/// soon as the residual distance exceeds the radius. The centre defaults to
/// the origin.
pub fn enumerate(
    b: &IntMatrix,
    radius2: &BigRational,
    centre: Option<&[BigRational]>,
    gs: &GramSchmidt,
    timeout: &Timeout,
) -> Result<Vec<EnumeratedVector>> {
    match gs {
        GramSchmidt::Exact(data) => enumerate_with(b, radius2, centre, data, (), timeout),
        GramSchmidt::Approx(data) => {
            let precision = data
                .bs
                .first()
                .and_then(|row| row.first())
                .map(|x| x.precision())
                .ok_or_else(|| Error::domain("enumerate requires a non-empty basis"))?;
            enumerate_with(b, radius2, centre, data, precision, timeout)
        }
    }
}

pub fn enumerate_with<T: Scalar>(
    b: &IntMatrix,
    radius2: &BigRational,
    centre: Option<&[BigRational]>,
    gs: &GramSchmidtData<T>,
    ctx: T::Ctx,
    timeout: &Timeout,
) -> Result<Vec<EnumeratedVector>> {
    timeout.check()?;

    let (n, d) = dimensions(b);
    if n == 0 || d == 0 {
        return Err(Error::domain("enumerate requires a non-empty basis"));
    }
    if n != d {
        return Err(Error::domain("enumerate requires a square basis matrix"));
    }

    // Coordinates of the centre in the basis, solved exactly.
    let ct: Vec<T> = match centre {
        None => vec![T::zero(ctx); n],
        Some(centre) => {
            if centre.len() != d {
                return Err(Error::domain("enumerate requires a centre of matching dimension"));
            }
            let b_rational = to_rational_matrix(b);
            let coordinates = solve_left(&b_rational, centre, None)?;
            coordinates.iter().map(|x| T::from_rational(x, ctx)).collect()
        }
    };

    let radius2 = T::from_rational(radius2, ctx);
    let bs_norm2: Vec<T> = (0..n).map(|i| norm2_scalar(&gs.bs[i], ctx)).collect();

    let mut out = Vec::new();
    let mut cx = vec![BigInt::zero(); n];

    descend(
        b,
        gs,
        &bs_norm2,
        &ct,
        &radius2,
        &mut cx,
        n,
        ctx,
        timeout,
        &mut out,
    )?;

    Ok(out)
}

/// One level of the enumeration tree: chooses the coordinate cx[k - 1].
#[allow(clippy::too_many_arguments)]
fn descend<T: Scalar>(
    b: &IntMatrix,
    gs: &GramSchmidtData<T>,
    bs_norm2: &[T],
    ct: &[T],
    radius2: &T,
    cx: &mut Vec<BigInt>,
    k: usize,
    ctx: T::Ctx,
    timeout: &Timeout,
    out: &mut Vec<EnumeratedVector>,
) -> Result<()> {
    timeout.check()?;

    let n = b.len();
    let d = b[0].len();

    if k == 0 {
        let vector: IntVector = (0..d)
            .map(|j| (0..n).map(|i| &cx[i] * &b[i][j]).sum())
            .collect();
        out.push(EnumeratedVector { coordinates: cx.clone(), vector });
        return Ok(());
    }

    // Offset of coordinate i from the centre's coordinate, as a scalar.
    let offset = |cx: &[BigInt], i: usize| -> T {
        T::from_int(&cx[i], ctx).sub(&ct[i])
    };

    // The projection of the remaining target onto b_{k-1}*, accounting for
    // the coordinates already fixed at deeper levels.
    let mut a = ct[k - 1].clone();
    for i in (k + 1)..=n {
        let term = gs.mu[i - 1][k - 1].mul(&offset(cx, i - 1));
        a = a.sub(&term);
    }

    // Residual squared distance contributed by the fixed coordinates.
    let mut residual2 = T::zero(ctx);
    for j in (k + 1)..=n {
        let mut term = offset(cx, j - 1);
        for i in (j + 1)..=n {
            let inner = gs.mu[i - 1][j - 1].mul(&offset(cx, i - 1));
            term = term.add(&inner);
        }
        let squared = term.mul(&term).mul(&bs_norm2[j - 1]);
        residual2 = residual2.add(&squared);
    }

    let budget2 = radius2.sub(&residual2).div(&bs_norm2[k - 1]);
    if budget2.is_negative() {
        return Ok(());
    }

    let centre_coordinate = a.round();

    let admissible = |candidate: &BigInt| -> bool {
        let distance = T::from_int(candidate, ctx).sub(&a);
        let squared = distance.mul(&distance);
        squared <= budget2
    };

    cx[k - 1] = centre_coordinate.clone();
    if admissible(&cx[k - 1]) {
        descend(b, gs, bs_norm2, ct, radius2, cx, k - 1, ctx, timeout, out)?;
    }

    // Zig-zag outward from the rounded centre until both sides fall out of
    // the admissible interval.
    let mut step = BigInt::one();
    loop {
        timeout.check()?;

        let mut proceed = false;

        cx[k - 1] = &centre_coordinate + &step;
        if admissible(&cx[k - 1]) {
            descend(b, gs, bs_norm2, ct, radius2, cx, k - 1, ctx, timeout, out)?;
            proceed = true;
        }

        cx[k - 1] = &centre_coordinate - &step;
        if admissible(&cx[k - 1]) {
            descend(b, gs, bs_norm2, ct, radius2, cx, k - 1, ctx, timeout, out)?;
            proceed = true;
        }

        if !proceed {
            break;
        }
        step += 1;
    }

    cx[k - 1] = BigInt::zero();
    Ok(())
}

/// Returns the lattice vector closest to the target t, by enumerating a ball
/// whose radius is the distance of Babai's estimate from t. Ties are broken
/// by the lexicographic order of the coordinate vector.
pub fn solve_cvp(
    b: &IntMatrix,
    t: &[BigRational],
    gs: &GramSchmidt,
    timeout: &Timeout,
) -> Result<IntVector> {
    let estimate = babai(b, t, gs)?;
    let estimate_rational = to_rational(&estimate);
    let difference: Vec<BigRational> = estimate_rational
        .iter()
        .zip(t.iter())
        .map(|(a, b)| a - b)
        .collect();
    let radius2 = norm2_rational(&difference);

    let found = enumerate(b, &radius2, Some(t), gs, timeout)?;

    let mut best: Option<(BigRational, &EnumeratedVector)> = None;
    for candidate in &found {
        let difference: Vec<BigRational> = candidate
            .vector
            .iter()
            .zip(t.iter())
            .map(|(a, b)| BigRational::from_integer(a.clone()) - b)
            .collect();
        let distance2 = norm2_rational(&difference);

        let better = match &best {
            None => true,
            Some((best_distance2, best_vector)) => {
                distance2 < *best_distance2
                    || (distance2 == *best_distance2
                        && candidate.coordinates < best_vector.coordinates)
            }
        };
        if better {
            best = Some((distance2, candidate));
        }
    }

    // Babai's estimate lies inside the ball, so the ball is never empty.
    best.map(|(_, candidate)| candidate.vector.clone())
        .ok_or_else(|| Error::domain("the enumeration ball is unexpectedly empty"))
}

/// Returns a shortest non-zero lattice vector, enumerating a ball of radius
/// ||b_1|| around the origin. Ties are broken by the lexicographic order of
/// the coordinate vector.
pub fn solve_svp(b: &IntMatrix, gs: &GramSchmidt, timeout: &Timeout) -> Result<IntVector> {
    if b.is_empty() {
        return Err(Error::domain("solve_svp requires a non-empty basis"));
    }

    let radius2 = BigRational::from_integer(crate::linear_algebra::vector::norm2(&b[0]));
    let found = enumerate(b, &radius2, None, gs, timeout)?;

    let mut best: Option<(BigRational, &EnumeratedVector)> = None;
    for candidate in &found {
        if candidate.vector.iter().all(|x| x.is_zero()) {
            continue;
        }
        let norm2 = BigRational::from_integer(crate::linear_algebra::vector::norm2(
            &candidate.vector,
        ));

        let better = match &best {
            None => true,
            Some((best_norm2, best_vector)) => {
                norm2 < *best_norm2
                    || (norm2 == *best_norm2 && candidate.coordinates < best_vector.coordinates)
            }
        };
        if better {
            best = Some((norm2, candidate));
        }
    }

    best.map(|(_, candidate)| candidate.vector.clone())
        .ok_or_else(|| Error::domain("solve_svp found no non-zero vector"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::lll::lll;
    use crate::linear_algebra::gram_schmidt::gram_schmidt;
    use crate::linear_algebra::vector::norm2;

    fn int_matrix(rows: &[&[i64]]) -> IntMatrix {
        rows.iter()
            .map(|row| row.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    fn rational_vector(values: &[i64]) -> Vec<BigRational> {
        values.iter().map(|&x| BigRational::from_integer(BigInt::from(x))).collect()
    }

    #[test]
    fn test_enumerate_unit_lattice_ball() {
        let b = int_matrix(&[&[1, 0], &[0, 1]]);
        let gs = gram_schmidt(&b, None);
        let radius2 = BigRational::from_integer(BigInt::from(1));

        let found = enumerate(&b, &radius2, None, &gs, &Timeout::indefinite()).unwrap();
        // (0, 0), (±1, 0), (0, ±1).
        assert_eq!(found.len(), 5);
        for candidate in &found {
            assert!(norm2(&candidate.vector) <= BigInt::from(1));
        }
    }

    #[test]
    fn test_enumerate_radius_zero_returns_centre_if_lattice_point() {
        let b = int_matrix(&[&[2, 0], &[0, 3]]);
        let gs = gram_schmidt(&b, None);
        let radius2 = BigRational::from_integer(BigInt::from(0));

        let centre = rational_vector(&[4, 3]);
        let found = enumerate(&b, &radius2, Some(&centre), &gs, &Timeout::indefinite()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vector, vec![BigInt::from(4), BigInt::from(3)]);

        // A centre outside the lattice yields nothing at radius zero.
        let centre = rational_vector(&[1, 1]);
        let found = enumerate(&b, &radius2, Some(&centre), &gs, &Timeout::indefinite()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_solve_svp_finds_shortest_vector() {
        use crate::core::timeout::Timeout;

        // The rows (7, 2) and (4, 6) span a lattice containing (3, -4)?
        // Reduce first; the shortest vector of this lattice has norm2 13:
        // (7, 2) - (4, 6) = (3, -4) has norm2 25; (4, 6) - (3, -4)...
        // Use LLL + exhaustive check instead of guessing.
        let a = int_matrix(&[&[7, 2], &[4, 6]]);
        let (b, gs) = lll(&a, 0.99, &Timeout::indefinite(), None).unwrap();
        let shortest = solve_svp(&b, &gs, &Timeout::indefinite()).unwrap();

        // Exhaustive scan over small coefficient combinations.
        let mut best = BigInt::from(i64::MAX);
        for c0 in -8i64..9 {
            for c1 in -8i64..9 {
                if c0 == 0 && c1 == 0 {
                    continue;
                }
                let v = vec![
                    BigInt::from(7 * c0 + 4 * c1),
                    BigInt::from(2 * c0 + 6 * c1),
                ];
                best = best.min(norm2(&v));
            }
        }

        assert_eq!(norm2(&shortest), best);
    }

    #[test]
    fn test_solve_cvp_strict_minimiser() {
        use crate::core::timeout::Timeout;

        let a = int_matrix(&[&[7, 0], &[3, 11]]);
        let (b, gs) = lll(&a, 0.99, &Timeout::indefinite(), None).unwrap();

        let t = rational_vector(&[15, 16]);
        let closest = solve_cvp(&b, &t, &gs, &Timeout::indefinite()).unwrap();

        let mut best = BigInt::from(i64::MAX);
        for c0 in -8i64..9 {
            for c1 in -8i64..9 {
                let v = vec![
                    BigInt::from(7 * c0 + 3 * c1 - 15),
                    BigInt::from(11 * c1 - 16),
                ];
                best = best.min(norm2(&v));
            }
        }

        let difference: Vec<BigInt> = vec![
            &closest[0] - BigInt::from(15),
            &closest[1] - BigInt::from(16),
        ];
        assert_eq!(norm2(&difference), best);
    }

    #[test]
    fn test_enumerate_respects_timeout() {
        let b = int_matrix(&[&[1, 0], &[0, 1]]);
        let gs = gram_schmidt(&b, None);
        let radius2 = BigRational::from_integer(BigInt::from(1 << 30));

        let timeout = Timeout::after_seconds(0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(
            enumerate(&b, &radius2, None, &gs, &timeout),
            Err(Error::TimedOut)
        );
    }
}
