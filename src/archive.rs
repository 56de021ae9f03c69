//! Recording archive capability set (§6): list/start/stop recordings and
//! replays. The archive is the external collaborator that actually persists
//! log bytes; this crate only drives it through this trait.

use std::collections::HashMap;

use transport::{PublicationHandle, SubscriptionHandle};

pub type RecordingId = i64;

pub const NULL_RECORDING_ID: RecordingId = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingDescriptor {
    pub recording_id: RecordingId,
    pub start_position: u64,
    pub stop_position: Option<u64>,
}

pub trait RecordingArchive {
    fn list_recording(&self, recording_id: RecordingId) -> Option<RecordingDescriptor>;

    /// Starts recording the given publication; returns the subscription
    /// handle the archive uses to track progress.
    fn start_recording(&mut self, channel: &str, stream_id: i32, publication: PublicationHandle) -> SubscriptionHandle;

    fn stop_recording(&mut self, recording_id: RecordingId);

    /// Starts replaying `length` bytes (or `None` for open-ended/to-the-end)
    /// from `start_position` of `recording_id`. Returns the replay session
    /// id the resulting image will report (§4.7: "the replay session id
    /// returned MUST equal i").
    fn start_replay(&mut self, recording_id: RecordingId, start_position: u64, length: Option<u64>) -> i64;

    /// Adds a recorded exclusive publication for snapshotting (§4.8).
    fn add_recorded_exclusive_publication(&mut self, channel: &str, stream_id: i32) -> (PublicationHandle, RecordingId);

    fn last_error(&self) -> Option<String>;
}

/// In-memory archive used by tests: recordings/replays are tracked only
/// well enough to hand back plausible, distinct ids and session numbers.
#[derive(Default)]
pub struct MemoryArchive {
    next_recording_id: RecordingId,
    next_subscription: SubscriptionHandle,
    next_publication: PublicationHandle,
    next_replay_session_id: i64,
    recordings: HashMap<RecordingId, RecordingDescriptor>,
}

impl MemoryArchive {
    pub fn new() -> MemoryArchive {
        MemoryArchive::default()
    }

    /// Test hook: registers a recording so `list_recording`/`start_replay`
    /// can resolve it, the way a real archive would already know about a
    /// recording written by an earlier run.
    pub fn seed_recording(&mut self, descriptor: RecordingDescriptor) {
        self.recordings.insert(descriptor.recording_id, descriptor);
    }
}

impl RecordingArchive for MemoryArchive {
    fn list_recording(&self, recording_id: RecordingId) -> Option<RecordingDescriptor> {
        self.recordings.get(&recording_id).cloned()
    }

    fn start_recording(&mut self, _channel: &str, _stream_id: i32, _publication: PublicationHandle) -> SubscriptionHandle {
        self.next_subscription += 1;
        self.next_subscription
    }

    fn stop_recording(&mut self, _recording_id: RecordingId) {}

    fn start_replay(&mut self, _recording_id: RecordingId, _start_position: u64, _length: Option<u64>) -> i64 {
        let session_id = self.next_replay_session_id;
        self.next_replay_session_id += 1;
        session_id
    }

    fn add_recorded_exclusive_publication(&mut self, _channel: &str, _stream_id: i32) -> (PublicationHandle, RecordingId) {
        self.next_publication += 1;
        self.next_recording_id += 1;
        self.recordings.insert(
            self.next_recording_id,
            RecordingDescriptor {
                recording_id: self.next_recording_id,
                start_position: 0,
                stop_position: None,
            },
        );
        (self.next_publication, self.next_recording_id)
    }

    fn last_error(&self) -> Option<String> {
        None
    }
}
