// src/core/error.rs

use num::BigInt;
use std::collections::BTreeSet;
use std::fmt;

/// The failures surfaced at the crate boundary.
///
/// Recoverable absences (a lift that produces no candidate, a verifier that
/// matches nothing) are `Option`s, not errors. Everything here terminates the
/// operation that raised it; only `solve_r_for_factors` converts `TimedOut`
/// into `IncompleteFactorization` to hand back the factors found so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The cooperative deadline has elapsed.
    TimedOut,
    /// The factor solver ran out of iterations or time; carries every factor
    /// collected before the failure.
    IncompleteFactorization(BTreeSet<BigInt>),
    /// Exact inversion of a rank-deficient matrix.
    Singular,
    /// A contract violation on the inputs.
    Domain(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TimedOut => write!(f, "the timeout has elapsed"),
            Error::IncompleteFactorization(factors) => {
                write!(f, "the factorization is incomplete ({} factors found)", factors.len())
            }
            Error::Singular => write!(f, "the matrix is singular"),
            Error::Domain(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn domain(message: impl Into<String>) -> Self {
        Error::Domain(message.into())
    }
}
