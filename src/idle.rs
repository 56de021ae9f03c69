//! Cooperative idling (§9 "Cooperative idling" design note). Every spin-await
//! in startup/election/recovery calls into one of these between polls
//! instead of blocking a thread; `do_work`'s steady-state tick never touches
//! it.

use rand::distributions::{IndependentSample, Range};
use rand::thread_rng;

/// Invoked with the work count of the last poll. Implementations may spin,
/// yield, or back off; they must never block indefinitely on I/O.
pub trait IdleStrategy {
    fn idle(&mut self, work_count: i32);
}

/// Spins without yielding. Lowest latency, burns a core; fine for tests and
/// for nodes that own a dedicated core.
#[derive(Default)]
pub struct BusySpinIdleStrategy;

impl IdleStrategy for BusySpinIdleStrategy {
    fn idle(&mut self, _work_count: i32) {}
}

/// Yields the thread when idle, spins while busy. A reasonable default for a
/// node sharing a core with other tasks.
#[derive(Default)]
pub struct YieldingIdleStrategy;

impl IdleStrategy for YieldingIdleStrategy {
    fn idle(&mut self, work_count: i32) {
        if work_count <= 0 {
            ::std::thread::yield_now();
        }
    }
}

/// Escalates from spinning to yielding to a capped sleep the longer no work
/// is observed, matching the backoff shape used by the teacher's own
/// election-timeout jitter (`generate_election_timeout` in the original
/// `server/mod.rs`) but applied to idle backoff rather than timer jitter.
pub struct BackoffIdleStrategy {
    consecutive_idle: u32,
    max_sleep: ::std::time::Duration,
}

impl BackoffIdleStrategy {
    pub fn new(max_sleep: ::std::time::Duration) -> BackoffIdleStrategy {
        BackoffIdleStrategy {
            consecutive_idle: 0,
            max_sleep: max_sleep,
        }
    }
}

impl Default for BackoffIdleStrategy {
    fn default() -> BackoffIdleStrategy {
        BackoffIdleStrategy::new(::std::time::Duration::from_millis(1))
    }
}

impl IdleStrategy for BackoffIdleStrategy {
    fn idle(&mut self, work_count: i32) {
        if work_count > 0 {
            self.consecutive_idle = 0;
            return;
        }
        self.consecutive_idle = self.consecutive_idle.saturating_add(1);
        if self.consecutive_idle < 10 {
            ::std::thread::yield_now();
            return;
        }
        let cap_micros = ::std::cmp::min(
            self.consecutive_idle as u64 * 10,
            self.max_sleep.as_secs() * 1_000_000 + u64::from(self.max_sleep.subsec_nanos()) / 1_000,
        );
        // Jittered the way the teacher's election timeout was (a Range
        // sample, not a fixed sleep) so that several nodes backing off at the
        // same instant don't all wake and retry in lockstep.
        let backoff_micros = if cap_micros > 1 {
            let spread = Range::new(cap_micros / 2, cap_micros);
            spread.ind_sample(&mut thread_rng())
        } else {
            cap_micros
        };
        ::std::thread::sleep(::std::time::Duration::from_micros(backoff_micros));
    }
}
