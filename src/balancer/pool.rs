//! Backend pool: registry, active strategy, and stats ownership.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::balancer::backend::{Backend, BackendSnapshot};
use crate::balancer::{make_strategy, BalanceError, Strategy, StrategyKind};
use crate::stats::{Period, StatsAggregator};

/// Registry plus the active strategy, guarded together so a selection
/// always sees a consistent pairing of backend set and strategy state.
struct PoolState {
    /// Insertion-ordered; rotation fairness and tie-breaking depend on
    /// this order being stable between mutations.
    backends: Vec<Arc<Backend>>,
    strategy: Box<dyn Strategy>,
    kind: StrategyKind,
}

impl PoolState {
    fn position(&self, address: &str) -> Option<usize> {
        self.backends.iter().position(|b| b.address() == address)
    }

    /// Discard strategy state. Run after any successful registry
    /// mutation so a stale cursor can never index a removed backend.
    fn reset_strategy(&mut self) {
        self.strategy = make_strategy(self.kind);
    }
}

/// The authoritative set of backends and everything that routes over it.
///
/// Owns the registry, the hot-swappable scheduling strategy, and the
/// selection stats log. All mutation goes through these methods; callers
/// only ever receive `Arc<Backend>` handles and immutable snapshots.
pub struct BackendPool {
    state: Mutex<PoolState>,
    stats: StatsAggregator,
}

impl BackendPool {
    pub fn new() -> Self {
        let kind = StrategyKind::RoundRobin;
        Self {
            state: Mutex::new(PoolState {
                backends: Vec::new(),
                strategy: make_strategy(kind),
                kind,
            }),
            stats: StatsAggregator::new(),
        }
    }

    /// Register a backend. Fails if the URL is already present.
    pub fn add(&self, url: Url, weight: u32) -> Result<(), BalanceError> {
        let mut state = self.state.lock().unwrap();
        if state.position(url.as_str()).is_some() {
            return Err(BalanceError::DuplicateBackend(url.to_string()));
        }

        tracing::info!(backend = %url, weight, "Backend added");
        state.backends.push(Arc::new(Backend::new(url, weight)));
        state.reset_strategy();
        Ok(())
    }

    /// Deregister a backend. In-flight requests to it are not drained;
    /// their counters are discarded with the entry.
    pub fn remove(&self, address: &str) -> Result<(), BalanceError> {
        let mut state = self.state.lock().unwrap();
        let Some(index) = state.position(address) else {
            return Err(BalanceError::UnknownBackend(address.to_string()));
        };

        tracing::info!(backend = %address, "Backend removed");
        state.backends.remove(index);
        state.reset_strategy();
        Ok(())
    }

    /// Swap the active strategy for a fresh instance of `name`.
    /// An unknown name leaves the previous strategy untouched.
    pub fn set_strategy(&self, name: &str) -> Result<(), BalanceError> {
        let kind: StrategyKind = name.parse()?;
        let mut state = self.state.lock().unwrap();
        state.kind = kind;
        state.reset_strategy();
        tracing::info!(strategy = %kind, "Scheduling strategy changed");
        Ok(())
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.state.lock().unwrap().kind
    }

    /// Pick the backend for the next request.
    ///
    /// Returns `None` only when no backends are registered. When probes
    /// have marked every backend unhealthy the pool fails open and
    /// schedules over the full set; a broken probe path should degrade
    /// health routing, not stop traffic.
    ///
    /// The chosen backend's in-flight counter is incremented and a stats
    /// record appended; the caller must `release` exactly once when the
    /// proxied exchange finishes.
    pub fn select(&self) -> Option<Arc<Backend>> {
        let mut state = self.state.lock().unwrap();
        if state.backends.is_empty() {
            return None;
        }

        let healthy: Vec<Arc<Backend>> = state
            .backends
            .iter()
            .filter(|b| b.is_healthy())
            .cloned()
            .collect();
        let chosen = if healthy.is_empty() {
            let all = state.backends.clone();
            state.strategy.next(&all)
        } else {
            state.strategy.next(&healthy)
        };

        chosen.inc_connections();
        self.stats.record(chosen.address());
        crate::observability::metrics::record_selection(
            chosen.address(),
            state.kind.as_str(),
            chosen.active_connections(),
        );
        Some(chosen)
    }

    /// Like `select`, but with the release tied to the returned guard's
    /// lifetime instead of an explicit call.
    ///
    /// The proxy path must use this form: a request future can be
    /// dropped mid-forward (request timeout, client disconnect), and a
    /// release that only runs after the forward completes would leak the
    /// in-flight count and skew Least Connections.
    pub fn select_guarded(self: &Arc<Self>) -> Option<BackendConnectionGuard> {
        let backend = self.select()?;
        Some(BackendConnectionGuard {
            pool: self.clone(),
            backend,
        })
    }

    /// Mark one previously selected request as finished, success or
    /// failure. Unknown addresses (backend removed meanwhile) and
    /// already-zero counters are silently ignored.
    pub fn release(&self, address: &str) {
        let state = self.state.lock().unwrap();
        if let Some(index) = state.position(address) {
            let backend = &state.backends[index];
            backend.dec_connections();
            crate::observability::metrics::record_release(address, backend.active_connections());
        }
    }

    /// Snapshots of every backend, in registry order.
    pub fn list(&self) -> Vec<BackendSnapshot> {
        let state = self.state.lock().unwrap();
        state.backends.iter().map(|b| b.snapshot()).collect()
    }

    /// Registered URLs, for the health prober's per-tick snapshot.
    pub fn addresses(&self) -> Vec<Url> {
        let state = self.state.lock().unwrap();
        state.backends.iter().map(|b| b.url.clone()).collect()
    }

    /// Health-prober write path. A no-op if the backend was removed
    /// while the probe was in flight.
    pub fn set_health(&self, address: &str, healthy: bool) {
        let state = self.state.lock().unwrap();
        if let Some(index) = state.position(address) {
            let backend = &state.backends[index];
            if backend.is_healthy() != healthy {
                tracing::info!(backend = %address, healthy, "Backend health changed");
            }
            backend.set_healthy(healthy);
        }
    }

    /// Per-period, per-backend selection counts.
    ///
    /// `periods` of `None` means all six named periods. Unknown or
    /// duplicated period names are a caller error. Counts only cover the
    /// 24h retention window, so `all` means "since process start or the
    /// last trim", not an unbounded total.
    pub fn stats(
        &self,
        periods: Option<&[String]>,
    ) -> Result<BTreeMap<&'static str, BTreeMap<String, u64>>, BalanceError> {
        let periods = match periods {
            None => Period::ALL.to_vec(),
            Some(names) => {
                let mut parsed = Vec::with_capacity(names.len());
                for name in names {
                    let period: Period = name.parse()?;
                    if parsed.contains(&period) {
                        return Err(BalanceError::InvalidPeriod(format!(
                            "duplicate period: {name}"
                        )));
                    }
                    parsed.push(period);
                }
                parsed
            }
        };

        let registered: Vec<String> = {
            let state = self.state.lock().unwrap();
            state
                .backends
                .iter()
                .map(|b| b.address().to_string())
                .collect()
        };
        Ok(self.stats.counts(&periods, &registered))
    }
}

impl Default for BackendPool {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII release token for one selection made via `select_guarded`.
pub struct BackendConnectionGuard {
    pool: Arc<BackendPool>,
    backend: Arc<Backend>,
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        self.pool.release(self.backend.address());
    }
}
