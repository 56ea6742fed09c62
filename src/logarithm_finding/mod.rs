// src/logarithm_finding/mod.rs

pub mod general;
pub mod short;

use serde::{Deserialize, Serialize};

/// How the multi-pair logarithm solvers search the reduced lattice around
/// the target vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumerationOptions {
    /// Babai's nearest-plane estimate only.
    Skip,
    /// Enumerate the tau-bounded ball around the target, stopping at the
    /// first verified candidate.
    Enumerate,
    /// Solve the closest vector problem exactly and use that single
    /// candidate.
    ClosestVector,
    /// Enumerate the tau-bounded ball around the target, stopping at the
    /// first verified candidate.
    BoundedByTau,
}

pub use general::{
    solve_j_k_for_d_given_r, solve_multiple_j_k_for_d_given_r, DEFAULT_ETA_BOUND, DEFAULT_T_BOUND,
};
pub use short::{expected_u_for_j_k_d, solve_j_k_for_d, solve_multiple_j_k_for_d};
