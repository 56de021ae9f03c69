use std::collections::HashMap;

/// A deadline-ordered set of scheduled timers (§3 `TimerService`, §4.6).
///
/// `schedule`/`cancel` mutate the map directly; `poll` is the only method
/// that needs the ordered view, so it is rebuilt lazily from the map rather
/// than maintained incrementally — the teacher's own `update_commit_index`
/// takes the same "collect, sort, pick" approach rather than keeping a
/// running structure up to date.
#[derive(Clone, Debug, Default)]
pub struct TimerService {
    deadlines: HashMap<u64, i64>,
}

impl TimerService {
    pub fn new() -> TimerService {
        TimerService {
            deadlines: HashMap::new(),
        }
    }

    /// Inserts or overwrites the deadline for `correlation_id`.
    pub fn schedule(&mut self, correlation_id: u64, deadline_ms: i64) {
        self.deadlines.insert(correlation_id, deadline_ms);
    }

    /// Removes the timer, if any. Returns whether one was present.
    pub fn cancel(&mut self, correlation_id: u64) -> bool {
        self.deadlines.remove(&correlation_id).is_some()
    }

    pub fn contains(&self, correlation_id: u64) -> bool {
        self.deadlines.contains_key(&correlation_id)
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Returns the correlation ids whose deadline has elapsed, ascending by
    /// deadline so the earliest-scheduled timer fires first within a tick.
    pub fn expired(&self, now_ms: i64) -> Vec<(u64, i64)> {
        let mut due: Vec<(u64, i64)> = self
            .deadlines
            .iter()
            .filter(|&(_, &deadline)| deadline <= now_ms)
            .map(|(&id, &deadline)| (id, deadline))
            .collect();
        due.sort_by_key(|&(_, deadline)| deadline);
        due
    }

    /// Snapshot of all scheduled (correlation_id, deadline_ms) pairs, used by
    /// §4.8's timer-service snapshot record.
    pub fn snapshot(&self) -> Vec<(u64, i64)> {
        self.deadlines.iter().map(|(&id, &deadline)| (id, deadline)).collect()
    }

    /// Restores state from a snapshot (§4.7's snapshot loader).
    pub fn restore(&mut self, entries: Vec<(u64, i64)>) {
        self.deadlines.clear();
        for (id, deadline) in entries {
            self.deadlines.insert(id, deadline);
        }
    }
}
