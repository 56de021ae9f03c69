//! Externally observable shared counters (§9 "Shared counters" design note):
//! recording-position, commit-position, module-state, cluster-role. These
//! outlive individual role transitions, so progress-advance writes use
//! ordered atomic stores and staleness-tolerant reads use plain loads.

use std::sync::atomic::{AtomicI64, Ordering};

/// A monotonically-advancing position counter (recording-position or
/// commit-position, §3/§4.4). `advance` refuses to move the value backwards,
/// matching the "commit position is monotone non-decreasing" invariant
/// (§8).
#[derive(Default)]
pub struct PositionCounter {
    value: AtomicI64,
}

impl PositionCounter {
    pub fn new(initial: i64) -> PositionCounter {
        PositionCounter {
            value: AtomicI64::new(initial),
        }
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Advances the counter if `new_value` is greater than the current
    /// value; returns whether it actually advanced.
    pub fn advance(&self, new_value: i64) -> bool {
        loop {
            let current = self.value.load(Ordering::Acquire);
            if new_value <= current {
                return false;
            }
            if self
                .value
                .compare_exchange(current, new_value, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Unconditional set, used for counters that are "set-ordered" rather
    /// than "propose-max-ordered" (§5, the leader's own commit counter).
    pub fn set(&self, new_value: i64) {
        self.value.store(new_value, Ordering::Release);
    }
}

/// Module-state / cluster-role counters are small enums observed
/// externally; staleness is acceptable so reads use a plain load.
#[derive(Default)]
pub struct StateCounter {
    value: AtomicI64,
}

impl StateCounter {
    pub fn new(initial: i64) -> StateCounter {
        StateCounter {
            value: AtomicI64::new(initial),
        }
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_counter_refuses_to_go_backwards() {
        let counter = PositionCounter::new(10);
        assert!(!counter.advance(5));
        assert_eq!(counter.get(), 10);
        assert!(counter.advance(20));
        assert_eq!(counter.get(), 20);
    }

    #[test]
    fn state_counter_plain_read_write() {
        let counter = StateCounter::new(0);
        counter.set(3);
        assert_eq!(counter.get(), 3);
    }
}
