//! Backend pool and scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy request → pool.rs select()
//!     → healthy backend view (fail-open to full set if none healthy)
//!     → Apply active scheduling strategy:
//!         - round_robin.rs (rotate through backends)
//!         - weighted.rs (smooth weighted rotation)
//!         - least_conn.rs (pick backend with fewest in-flight requests)
//!     → increment in-flight counter, append stats record
//!     → Return backend (caller releases after the proxied exchange)
//!
//! Control operations (add/remove/set_strategy) mutate the registry
//! through the pool and reset the active strategy's internal state.
//! ```
//!
//! # Design Decisions
//! - Registry is insertion-ordered; rotation fairness depends on it
//! - Strategies hold only resumption state (cursor/counters), never
//!   backend data; the pool hands them a live candidate view per call
//! - Strategy state is discarded on every registry mutation so a cursor
//!   can never index a removed backend
//! - Per-backend counters are atomics; the registry itself sits behind a
//!   mutex that is never held across an await point

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;
pub mod weighted;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use self::backend::Backend;

/// Errors surfaced by pool control operations.
///
/// An empty pool is not in this taxonomy: `select()` returns `None` for
/// it, since having no backends is an expected operating state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("backend already registered: {0}")]
    DuplicateBackend(String),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("unknown scheduling strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid stats period: {0}")]
    InvalidPeriod(String),
}

/// The closed set of scheduling strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RoundRobin,
    WeightedRoundRobin,
    LeastConnections,
}

impl StrategyKind {
    /// Wire name used by the control API and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "round_robin",
            StrategyKind::WeightedRoundRobin => "weighted",
            StrategyKind::LeastConnections => "least_conn",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(StrategyKind::RoundRobin),
            "weighted" => Ok(StrategyKind::WeightedRoundRobin),
            "least_conn" => Ok(StrategyKind::LeastConnections),
            other => Err(BalanceError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend-selection algorithm.
///
/// `next` is only ever called with a non-empty candidate slice; the pool
/// guarantees this. Candidates arrive in registry (insertion) order, which
/// is what tie-breaking rules refer to.
pub trait Strategy: Send + fmt::Debug {
    fn next(&mut self, candidates: &[Arc<Backend>]) -> Arc<Backend>;
}

/// Construct a fresh instance of the given strategy kind.
///
/// Called by the pool whenever the backend set changes, so strategies
/// always start from zeroed state over the new set.
pub fn make_strategy(kind: StrategyKind) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::RoundRobin => Box::new(round_robin::RoundRobin::new()),
        StrategyKind::WeightedRoundRobin => Box::new(weighted::WeightedRoundRobin::new()),
        StrategyKind::LeastConnections => Box::new(least_conn::LeastConnections::new()),
    }
}
