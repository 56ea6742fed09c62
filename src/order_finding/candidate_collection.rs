// src/order_finding/candidate_collection.rs

use num::{BigInt, Integer, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A collection of candidates for r_tilde, kept reduced under divisibility.
///
/// The collection represents the set of all positive multiples of its
/// members; only the minimal generators are stored. If some stored s divides
/// a candidate c, then c is already represented and adding it changes
/// nothing; conversely adding c evicts every stored multiple of c.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCollection {
    candidates: BTreeSet<BigInt>,
}

impl CandidateCollection {
    pub fn new() -> Self {
        CandidateCollection { candidates: BTreeSet::new() }
    }

    /// Adds a candidate. Returns true iff the collection changed.
    pub fn add(&mut self, candidate: BigInt) -> bool {
        if candidate.is_zero() || self.contains(&candidate) {
            return false;
        }

        self.candidates.retain(|x| !x.mod_floor(&candidate).is_zero());
        self.candidates.insert(candidate);

        true
    }

    /// True iff some stored generator divides the candidate.
    pub fn contains(&self, candidate: &BigInt) -> bool {
        self.candidates
            .iter()
            .any(|x| candidate.mod_floor(x).is_zero())
    }

    /// The number of minimal generators representing the collection.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterates over the minimal generators in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &BigInt> {
        self.candidates.iter()
    }

    /// The smallest stored generator, if any.
    pub fn min(&self) -> Option<&BigInt> {
        self.candidates.iter().next()
    }
}
