// src/integer_math/crt.rs

use num::{BigInt, Integer, One};

use crate::core::error::{Error, Result};
use crate::integer_math::modular::mod_inv;

/// Given values [v_1, .., v_n] and pairwise coprime moduli [N_1, .., N_n],
/// all N_i >= 2, returns the unique v in [0, N_1 * .. * N_n) with
/// v = v_i (mod N_i) for every i.
///
/// Computed by iterated two-modulus CRT; the intermediate modulus grows
/// monotonically.
pub fn crt(values: &[BigInt], moduli: &[BigInt]) -> Result<BigInt> {
    if values.len() != moduli.len() || values.is_empty() {
        return Err(Error::domain("crt requires matching, non-empty values and moduli"));
    }

    for modulus in moduli {
        if modulus < &BigInt::from(2) {
            return Err(Error::domain("crt requires every modulus to be at least two"));
        }
    }

    let mut v = values[0].mod_floor(&moduli[0]);
    let mut n = moduli[0].clone();

    for (value, modulus) in values.iter().zip(moduli.iter()).skip(1) {
        // v' = v (mod n) and v' = value (mod modulus) with n, modulus coprime.
        let inv = mod_inv(&n, modulus)
            .ok_or_else(|| Error::domain("crt requires pairwise coprime moduli"))?;

        let difference = (value - &v).mod_floor(modulus);
        v += &n * ((difference * inv).mod_floor(modulus));
        n *= modulus;
    }

    Ok(v)
}

/// Convenience check that the moduli are pairwise coprime.
pub fn are_pairwise_coprime(moduli: &[BigInt]) -> bool {
    for (i, a) in moduli.iter().enumerate() {
        for b in moduli.iter().skip(i + 1) {
            if !a.gcd(b).is_one() {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crt_two_moduli() {
        let v = crt(
            &[BigInt::from(2), BigInt::from(3)],
            &[BigInt::from(3), BigInt::from(5)],
        )
        .unwrap();
        assert_eq!(v, BigInt::from(8));
    }

    #[test]
    fn test_crt_three_moduli() {
        // v = 2 (mod 3), v = 3 (mod 5), v = 2 (mod 7) => v = 23 (mod 105).
        let v = crt(
            &[BigInt::from(2), BigInt::from(3), BigInt::from(2)],
            &[BigInt::from(3), BigInt::from(5), BigInt::from(7)],
        )
        .unwrap();
        assert_eq!(v, BigInt::from(23));
    }

    #[test]
    fn test_crt_range_and_congruence() {
        let moduli = [BigInt::from(4), BigInt::from(9), BigInt::from(25), BigInt::from(7)];
        let values = [BigInt::from(3), BigInt::from(7), BigInt::from(11), BigInt::from(2)];
        let product: BigInt = moduli.iter().product();

        let v = crt(&values, &moduli).unwrap();
        assert!(v >= BigInt::from(0) && v < product);
        for (value, modulus) in values.iter().zip(moduli.iter()) {
            assert_eq!(v.mod_floor(modulus), value.mod_floor(modulus));
        }
    }

    #[test]
    fn test_crt_rejects_bad_inputs() {
        assert!(crt(&[], &[]).is_err());
        assert!(crt(&[BigInt::from(0)], &[BigInt::from(1)]).is_err());
        // Non-coprime moduli.
        assert!(crt(
            &[BigInt::from(1), BigInt::from(2)],
            &[BigInt::from(6), BigInt::from(4)],
        )
        .is_err());
    }

    #[test]
    fn test_are_pairwise_coprime() {
        assert!(are_pairwise_coprime(&[BigInt::from(3), BigInt::from(5), BigInt::from(7)]));
        assert!(!are_pairwise_coprime(&[BigInt::from(6), BigInt::from(10)]));
    }
}
