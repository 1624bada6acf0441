use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::{Arc, RwLock};

/// Source of the engine's notion of "now" and "today".
///
/// The engine day is pinned to UTC so the "is it due today" check never
/// depends on the host timezone or daylight-saving transitions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually-advanced clock for tests and deterministic replays.
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}
