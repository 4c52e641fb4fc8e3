use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    HealthyBusy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: HealthStatus,
    pub time_of_last_update: u64,
}

/// Tracks in-flight invocations for `/ping`.
///
/// `time_of_last_update` moves whenever the status flips between idle and
/// busy.
#[derive(Debug)]
pub struct HealthTracker {
    in_flight: AtomicUsize,
    last_update: AtomicU64,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            last_update: AtomicU64::new(unix_now()),
        }
    }

    /// Marks one invocation as in flight until the guard drops.
    pub fn begin(&self) -> BusyGuard<'_> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.touch();
        }
        BusyGuard { tracker: self }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PingResponse {
        let status = if self.in_flight() > 0 {
            HealthStatus::HealthyBusy
        } else {
            HealthStatus::Healthy
        };
        PingResponse {
            status,
            time_of_last_update: self.last_update.load(Ordering::SeqCst),
        }
    }

    fn finish(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.touch();
        }
    }

    fn touch(&self) {
        self.last_update.store(unix_now(), Ordering::SeqCst);
    }
}

#[must_use = "the invocation is only counted while the guard is alive"]
#[derive(Debug)]
pub struct BusyGuard<'a> {
    tracker: &'a HealthTracker,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
