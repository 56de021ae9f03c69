//! Control file capability set (§6): `updateActivityTimestamp`, the single
//! call the sequencer makes into it each slow tick so external liveness
//! tooling can tell the node is still making progress.

pub trait ControlFile {
    fn update_activity_timestamp(&mut self, now_ms: i64);
}

#[derive(Default)]
pub struct InMemoryControlFile {
    pub last_activity_timestamp: i64,
}

impl ControlFile for InMemoryControlFile {
    fn update_activity_timestamp(&mut self, now_ms: i64) {
        self.last_activity_timestamp = now_ms;
    }
}
