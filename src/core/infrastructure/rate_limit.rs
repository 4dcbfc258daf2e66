use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Which budget a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyClass {
    /// Ordinary lyric lookups.
    General,
    /// Custom provider sequences and admin cache clears.
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub limit: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// `retry_after_secs` is never below one.
    Denied { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Fixed-window limiter keyed by client identity and policy class.
pub struct RateLimiter {
    general: RatePolicy,
    heavy: RatePolicy,
    /// (identity, class) -> (count, window_start)
    windows: DashMap<(String, PolicyClass), (u32, Instant)>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            RatePolicy::new(15, Duration::from_secs(60)),
            RatePolicy::new(5, Duration::from_secs(600)),
        )
    }
}

impl RateLimiter {
    pub fn new(general: RatePolicy, heavy: RatePolicy) -> Self {
        Self {
            general,
            heavy,
            windows: DashMap::new(),
        }
    }

    pub fn policy(&self, class: PolicyClass) -> RatePolicy {
        match class {
            PolicyClass::General => self.general,
            PolicyClass::Heavy => self.heavy,
        }
    }

    pub fn admit(&self, identity: &str, class: PolicyClass) -> Admission {
        let policy = self.policy(class);
        let now = Instant::now();

        let mut entry = self
            .windows
            .entry((identity.to_string(), class))
            .or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= policy.window {
            *count = 0;
            *window_start = now;
        }

        if *count >= policy.limit {
            let remaining = policy.window.saturating_sub(now.duration_since(*window_start));
            let retry_after_secs = remaining.as_secs_f64().ceil().max(1.0) as u64;
            debug!("Rate limit hit for {} ({:?}), retry in {}s", identity, class, retry_after_secs);
            return Admission::Denied { retry_after_secs };
        }

        *count += 1;
        Admission::Allowed
    }

    /// Drop windows that have run out. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|(_, class), (_, window_start)| {
                now.duration_since(*window_start) < self.policy(*class).window
            });
        before - self.windows.len()
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
