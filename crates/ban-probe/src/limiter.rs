//! Per-caller fixed-window rate limiting.
//!
//! Each caller gets a counter that resets once its window has elapsed. This is
//! a coarse fixed window: a caller can get up to twice the limit
//! in a short burst straddling a window boundary.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Window length in seconds.
pub const WINDOW_SECS: i64 = 60;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Counter state for one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    pub count: u32,
    pub window_start: i64,
}

/// Per-caller limiter shared across all in-flight requests.
pub struct RateLimiter {
    limit: u32,
    window_secs: i64,
    records: DashMap<String, RateRecord>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter admitting `limit` requests per caller per minute.
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            window_secs: WINDOW_SECS,
            records: DashMap::new(),
            clock,
        }
    }

    /// Limiter that practically never rejects, for tests.
    pub fn permissive() -> Self {
        Self::new(u32::MAX)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit or reject one request from `caller`.
    ///
    /// The entry guard holds the shard lock, so concurrent requests from the
    /// same caller cannot interleave their read-modify-write.
    pub fn admit(&self, caller: &str) -> bool {
        let now = self.clock.now_unix();

        let mut entry = self
            .records
            .entry(caller.to_string())
            .or_insert(RateRecord {
                count: 0,
                window_start: now,
            });
        let record = entry.value_mut();

        if now - record.window_start >= self.window_secs {
            *record = RateRecord {
                count: 1,
                window_start: now,
            };
            return true;
        }

        if record.count < self.limit {
            record.count += 1;
            true
        } else {
            debug!(caller, count = record.count, "Caller over quota");
            false
        }
    }

    /// Current record for `caller`, if any.
    pub fn record(&self, caller: &str) -> Option<RateRecord> {
        self.records.get(caller).map(|r| *r.value())
    }

    /// Number of callers currently tracked.
    pub fn tracked_callers(&self) -> usize {
        self.records.len()
    }

    /// Drop records whose window has elapsed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_unix();
        let before = self.records.len();
        self.records
            .retain(|_, record| now - record.window_start < self.window_secs);
        before.saturating_sub(self.records.len())
    }

    /// Run `sweep_expired` every `interval`, indefinitely.
    pub async fn run_sweeper(&self, interval: Duration) {
        info!("Starting rate limit sweeper, interval: {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = self.sweep_expired();
            if removed > 0 {
                debug!(removed, remaining = self.tracked_callers(), "Swept stale rate records");
            }
        }
    }
}

/// Spawn the stale-record sweeper as a background task.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        limiter.run_sweeper(interval).await;
    })
}
