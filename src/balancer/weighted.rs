//! Smooth weighted round-robin scheduling strategy.

use std::sync::Arc;

use crate::balancer::backend::Backend;
use crate::balancer::Strategy;

/// Weighted round-robin selector.
///
/// Every call adds each candidate's weight to its running counter, picks
/// the candidate with the largest counter (earliest in registry order on
/// a tie) and zeroes the winner's counter. Long-run selection frequency
/// is proportional to weight, and low-weight backends are interleaved
/// rather than starved until the end of a cycle.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    /// Addresses the counters were seeded for, in candidate order.
    members: Vec<String>,
    counters: Vec<u64>,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for WeightedRoundRobin {
    fn next(&mut self, candidates: &[Arc<Backend>]) -> Arc<Backend> {
        // Health flips change the candidate view between calls without a
        // pool-level reset, and one backend flipping healthy while
        // another flips unhealthy keeps the size the same. Counters only
        // mean something for the exact membership they accumulated over,
        // so any difference starts them over.
        let same_members = self.members.len() == candidates.len()
            && self
                .members
                .iter()
                .zip(candidates)
                .all(|(m, b)| m == b.address());
        if !same_members {
            self.members = candidates.iter().map(|b| b.address().to_string()).collect();
            self.counters = vec![0; candidates.len()];
        }

        let mut winner = 0;
        for (i, backend) in candidates.iter().enumerate() {
            self.counters[i] += u64::from(backend.weight);
            if self.counters[i] > self.counters[winner] {
                winner = i;
            }
        }
        self.counters[winner] = 0;
        candidates[winner].clone()
    }
}
