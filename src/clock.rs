use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch-millis clock, dynamically dispatched per the design notes (§9) so
/// tests can supply a fake that advances deterministically.
pub trait EpochClock {
    fn now_ms(&self) -> i64;
}

/// The clock the agent uses outside of tests: wall time since the epoch.
pub struct SystemEpochClock;

impl EpochClock for SystemEpochClock {
    fn now_ms(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| ::std::time::Duration::from_millis(0));
        now.as_secs() as i64 * 1000 + i64::from(now.subsec_nanos() / 1_000_000)
    }
}

#[cfg(test)]
pub struct FakeClock {
    pub millis: ::std::cell::Cell<i64>,
}

#[cfg(test)]
impl FakeClock {
    pub fn new(start_ms: i64) -> FakeClock {
        FakeClock {
            millis: ::std::cell::Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.millis.set(self.millis.get() + delta_ms);
    }
}

#[cfg(test)]
impl EpochClock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.millis.get()
    }
}
