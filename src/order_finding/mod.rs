// src/order_finding/mod.rs

pub mod algorithms;
pub mod candidate_collection;
pub mod multiple;
pub mod solve;

pub use candidate_collection::CandidateCollection;
pub use multiple::{solve_multiple_j_for_r, EnumerationOptions};
pub use solve::{
    solve_j_for_r, solve_j_for_r_mod_n, SolutionMethods, DEFAULT_OFFSET_BOUND,
};
