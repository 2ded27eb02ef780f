//! Least Connections scheduling strategy.

use std::sync::Arc;

use crate::balancer::backend::Backend;
use crate::balancer::Strategy;

/// Least connections selector.
///
/// Picks the candidate with the fewest in-flight requests, recomputed
/// from live counters on every call. Ties go to the earliest backend in
/// registry order. No internal state to invalidate.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for LeastConnections {
    fn next(&mut self, candidates: &[Arc<Backend>]) -> Arc<Backend> {
        // min_by_key keeps the first of equally-minimal elements, which
        // is exactly the registry-order tie break.
        candidates
            .iter()
            .min_by_key(|b| b.active_connections())
            .cloned()
            .unwrap_or_else(|| candidates[0].clone())
    }
}
