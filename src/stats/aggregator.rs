//! Sliding-window selection counts.

use std::collections::{BTreeMap, VecDeque};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::balancer::BalanceError;

/// Records older than this are dropped; also the span of the largest
/// bounded query window.
const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// The named query windows supported by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    SixHours,
    TwentyFourHours,
    All,
}

impl Period {
    /// All periods, in the order reports list them.
    pub const ALL: [Period; 6] = [
        Period::FiveMinutes,
        Period::ThirtyMinutes,
        Period::OneHour,
        Period::SixHours,
        Period::TwentyFourHours,
        Period::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveMinutes => "5m",
            Period::ThirtyMinutes => "30m",
            Period::OneHour => "1h",
            Period::SixHours => "6h",
            Period::TwentyFourHours => "24h",
            Period::All => "all",
        }
    }

    /// Trailing window span; `None` means the whole retained log.
    fn window(&self) -> Option<Duration> {
        match self {
            Period::FiveMinutes => Some(Duration::from_secs(300)),
            Period::ThirtyMinutes => Some(Duration::from_secs(1800)),
            Period::OneHour => Some(Duration::from_secs(3600)),
            Period::SixHours => Some(Duration::from_secs(21600)),
            Period::TwentyFourHours => Some(RETENTION),
            Period::All => None,
        }
    }
}

impl FromStr for Period {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Period::FiveMinutes),
            "30m" => Ok(Period::ThirtyMinutes),
            "1h" => Ok(Period::OneHour),
            "6h" => Ok(Period::SixHours),
            "24h" => Ok(Period::TwentyFourHours),
            "all" => Ok(Period::All),
            other => Err(BalanceError::InvalidPeriod(other.to_string())),
        }
    }
}

#[derive(Debug)]
struct StatsRecord {
    address: String,
    at: Instant,
}

/// Append-only log of completed selections with windowed count queries.
///
/// Records are kept for 24 hours; the `all` period therefore reflects
/// retained history since process start or since the last trim, not an
/// unbounded total.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    records: Mutex<VecDeque<StatsRecord>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one selection for `address` at the current time.
    pub fn record(&self, address: &str) {
        self.record_at(address, Instant::now());
    }

    fn record_at(&self, address: &str, at: Instant) {
        let mut records = self.records.lock().unwrap();
        records.push_back(StatsRecord {
            address: address.to_string(),
            at,
        });
        // Rolling trim: the log is append-ordered, so expired records
        // are always at the front.
        while let Some(front) = records.front() {
            if at.saturating_duration_since(front.at) > RETENTION {
                records.pop_front();
            } else {
                break;
            }
        }
    }

    /// Per-period, per-address selection counts.
    ///
    /// Every address in `registered` is present in every period's map,
    /// reporting 0 when it has no matching records.
    pub fn counts(
        &self,
        periods: &[Period],
        registered: &[String],
    ) -> BTreeMap<&'static str, BTreeMap<String, u64>> {
        self.counts_at(periods, registered, Instant::now())
    }

    fn counts_at(
        &self,
        periods: &[Period],
        registered: &[String],
        now: Instant,
    ) -> BTreeMap<&'static str, BTreeMap<String, u64>> {
        let records = self.records.lock().unwrap();
        let mut result = BTreeMap::new();

        for period in periods {
            let mut backends: BTreeMap<String, u64> = registered
                .iter()
                .map(|address| (address.clone(), 0))
                .collect();

            for record in records.iter() {
                let in_window = match period.window() {
                    Some(window) => now.saturating_duration_since(record.at) <= window,
                    None => true,
                };
                if in_window {
                    *backends.entry(record.address.clone()).or_insert(0) += 1;
                }
            }

            result.insert(period.as_str(), backends);
        }

        result
    }
}
