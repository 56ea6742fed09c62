// src/integer_math/continued_fractions.rs

use num::integer::Roots;
use num::{BigInt, Integer, One, Signed, Zero};

use crate::core::error::{Error, Result};

/// Expands j / 2^(m + l) in continued fractions and returns the ordered list
/// of convergent denominators strictly below the bound, each denominator
/// exactly once and strictly increasing.
///
/// The bound defaults to floor(2^((m + l) / 2)). The expansion terminates
/// when the remainder reaches zero; j = 0 yields the empty list.
pub fn continued_fractions(
    j: &BigInt,
    m: u32,
    l: u32,
    denominator_bound: Option<BigInt>,
) -> Result<Vec<BigInt>> {
    let pow2ml: BigInt = BigInt::one() << (m + l) as usize;

    if j.is_negative() || j >= &pow2ml {
        return Err(Error::domain("the frequency j must lie on [0, 2^(m + l))"));
    }

    let bound = match denominator_bound {
        Some(bound) => bound,
        None => pow2ml.sqrt(),
    };

    let mut denominators: Vec<BigInt> = Vec::new();

    if j.is_zero() {
        return Ok(denominators);
    }

    // Convergent denominator recursion q_i = a_i * q_{i-1} + q_{i-2}.
    let mut km1 = BigInt::zero();
    let mut km2 = BigInt::one();

    let mut numerator = j.clone();
    let mut denominator = pow2ml;

    loop {
        let integer_part = numerator.div_floor(&denominator);

        let q = &integer_part * &km1 + &km2;
        if q >= bound {
            break;
        }

        if denominators.last() != Some(&q) {
            denominators.push(q.clone());
        }

        km2 = km1;
        km1 = q;

        // The next fraction is 1 / (f - floor(f)).
        let remainder = numerator - integer_part * &denominator;
        if remainder.is_zero() {
            break;
        }
        numerator = denominator;
        denominator = remainder;
    }

    Ok(denominators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frequency_yields_empty_list() {
        assert_eq!(continued_fractions(&BigInt::zero(), 4, 4, None).unwrap(), vec![]);
    }

    #[test]
    fn test_out_of_range_frequency_is_rejected() {
        assert!(continued_fractions(&BigInt::from(-1), 4, 4, None).is_err());
        assert!(continued_fractions(&BigInt::from(256), 4, 4, None).is_err());
    }

    #[test]
    fn test_155_over_256() {
        // 155/256 = [0; 1, 1, 1, 1, 4, 1, 5]; denominators below 16 are
        // 1, 2, 3, 5 once the duplicate leading 1 is collapsed.
        let denominators = continued_fractions(&BigInt::from(155), 4, 4, None).unwrap();
        assert_eq!(
            denominators,
            vec![BigInt::from(1), BigInt::from(2), BigInt::from(3), BigInt::from(5)]
        );
    }

    #[test]
    fn test_denominators_strictly_increase() {
        for j in [1u64, 7, 100, 155, 200, 255, 977, 1000] {
            let denominators = continued_fractions(&BigInt::from(j), 5, 5, None).unwrap();
            for pair in denominators.windows(2) {
                assert!(pair[0] < pair[1]);
            }
            let bound = (BigInt::one() << 10u32).sqrt();
            for q in &denominators {
                assert!(q < &bound);
            }
        }
    }

    #[test]
    fn test_explicit_bound() {
        let denominators =
            continued_fractions(&BigInt::from(155), 4, 4, Some(BigInt::from(4))).unwrap();
        assert_eq!(denominators, vec![BigInt::from(1), BigInt::from(2), BigInt::from(3)]);
    }

    #[test]
    fn test_exact_fraction_terminates() {
        // 192/256 = 3/4: convergents 0/1, 1/1, 3/4 stop at the exact value.
        let denominators = continued_fractions(&BigInt::from(192), 4, 4, None).unwrap();
        assert_eq!(denominators, vec![BigInt::from(1), BigInt::from(4)]);
    }
}
