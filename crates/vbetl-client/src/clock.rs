use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime};

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock for exercising token expiry.
#[derive(Debug)]
pub struct MockClock {
    now: RwLock<SystemTime>,
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockClock {
    #[must_use]
    pub fn with_time(time: SystemTime) -> Self {
        Self {
            now: RwLock::new(time),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += duration;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::with_time(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}
