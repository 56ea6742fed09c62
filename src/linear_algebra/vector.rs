// src/linear_algebra/vector.rs

use num::{BigInt, BigRational, Zero};

use crate::linear_algebra::scalar::Scalar;

pub type IntVector = Vec<BigInt>;
pub type RatVector = Vec<BigRational>;

/// Inner product of two integer vectors of equal length.
pub fn dot(u: &[BigInt], v: &[BigInt]) -> BigInt {
    debug_assert_eq!(u.len(), v.len());
    u.iter().zip(v.iter()).map(|(a, b)| a * b).sum()
}

/// Squared Euclidean norm of an integer vector.
pub fn norm2(u: &[BigInt]) -> BigInt {
    dot(u, u)
}

/// Inner product over any Gram–Schmidt scalar type.
pub fn dot_scalar<T: Scalar>(u: &[T], v: &[T], ctx: T::Ctx) -> T {
    debug_assert_eq!(u.len(), v.len());
    u.iter()
        .zip(v.iter())
        .fold(T::zero(ctx), |acc, (a, b)| acc.add(&a.mul(b)))
}

/// Squared Euclidean norm over any Gram–Schmidt scalar type.
pub fn norm2_scalar<T: Scalar>(u: &[T], ctx: T::Ctx) -> T {
    dot_scalar(u, u, ctx)
}

/// Inner product of an integer vector with a scalar vector.
pub fn dot_int_scalar<T: Scalar>(u: &[BigInt], v: &[T], ctx: T::Ctx) -> T {
    debug_assert_eq!(u.len(), v.len());
    u.iter()
        .zip(v.iter())
        .fold(T::zero(ctx), |acc, (a, b)| acc.add(&b.mul_int(a)))
}

/// Converts an integer vector to rationals.
pub fn to_rational(u: &[BigInt]) -> RatVector {
    u.iter().map(|x| BigRational::from_integer(x.clone())).collect()
}

/// Squared Euclidean norm of a rational vector.
pub fn norm2_rational(u: &[BigRational]) -> BigRational {
    u.iter().map(|x| x * x).fold(<BigRational as Zero>::zero(), |acc, x| acc + x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(values: &[i64]) -> IntVector {
        values.iter().map(|&x| BigInt::from(x)).collect()
    }

    #[test]
    fn test_dot_and_norm2() {
        let u = vec_of(&[1, -2, 3]);
        let v = vec_of(&[4, 5, -6]);
        assert_eq!(dot(&u, &v), BigInt::from(4 - 10 - 18));
        assert_eq!(norm2(&u), BigInt::from(1 + 4 + 9));
    }

    #[test]
    fn test_norm2_rational() {
        let u = to_rational(&vec_of(&[3, 4]));
        assert_eq!(norm2_rational(&u), BigRational::from_integer(BigInt::from(25)));
    }
}
