// src/factoring/mod.rs

pub mod factor_collection;
pub mod rsa;
pub mod solve;

pub use factor_collection::FactorCollection;
pub use rsa::split_n_given_d;
pub use solve::{
    solve_j_for_factors, solve_j_for_factors_mod_n, solve_r_for_factors, FactorSolverOptions,
    OptProcessCompositeFactors,
};
