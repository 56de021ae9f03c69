//! Snapshot writer/reader (§4.8): marker-begin, one record per OPEN session,
//! the timer-service snapshot, the sequencer_state record, marker-end. Every
//! record is wrapped in the `SnapshotRecord` union envelope so the reader can
//! tell records apart without any outer framing (capnp messages don't
//! self-describe their struct kind the way a tagged `LogFrame` does).

use capnp::message::{Builder, HeapAllocator};

use log_record::SessionOpenRecord;
use log_record_capnp::snapshot_record;
use recovery::ReplayHandlers;
use session::{ClusterSession, SessionState};
use timer::TimerService;

fn to_bytes<A>(message: &Builder<A>) -> Vec<u8>
where
    A: ::capnp::message::Allocator,
{
    let mut buf = Vec::new();
    ::capnp::serialize_packed::write_message(&mut buf, message).expect("serializing snapshot record");
    buf
}

pub fn encode_marker(leadership_term_id: u64, log_position: u64, begin: bool, term_count: u32) -> Vec<u8> {
    let mut message = Builder::new_default();
    {
        let root = message.init_root::<snapshot_record::Builder>();
        let mut builder = root.init_marker();
        builder.set_leadership_term_id(leadership_term_id);
        builder.set_log_position(log_position);
        builder.set_begin(begin);
        builder.set_term_count(term_count);
    }
    to_bytes(&message)
}

pub fn encode_session(session: &ClusterSession) -> Option<Vec<u8>> {
    let open_term_position = match *session.state() {
        SessionState::Open { open_term_position } => open_term_position,
        _ => return None,
    };
    let mut message = Builder::new_default();
    {
        let root = message.init_root::<snapshot_record::Builder>();
        let mut builder = root.init_session();
        builder.set_session_id(session.id());
        builder.set_response_stream_id(session.response_stream_id());
        builder.set_response_channel(session.response_channel());
        builder.set_open_term_position(open_term_position);
        builder.set_time_of_last_activity(session.time_of_last_activity());
    }
    Some(to_bytes(&message))
}

pub fn encode_timers(timers: &TimerService) -> Vec<Vec<u8>> {
    timers
        .snapshot()
        .into_iter()
        .map(|(correlation_id, deadline)| {
            let mut message = Builder::new_default();
            {
                let root = message.init_root::<snapshot_record::Builder>();
                let mut builder = root.init_timer();
                builder.set_correlation_id(correlation_id);
                builder.set_deadline(deadline);
            }
            to_bytes(&message)
        })
        .collect()
}

pub fn encode_sequencer_state(next_session_id: u64) -> Vec<u8> {
    let mut message = Builder::new_default();
    {
        let root = message.init_root::<snapshot_record::Builder>();
        let mut builder = root.init_sequencer_state();
        builder.set_next_session_id(next_session_id);
    }
    to_bytes(&message)
}

/// One OPEN session as decoded back off a snapshot recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshotRecord {
    pub session_id: u64,
    pub response_stream_id: i32,
    pub response_channel: String,
    pub open_term_position: u64,
    pub time_of_last_activity: i64,
}

/// A decoded snapshot record of any kind, as delivered off a `SnapshotSource`
/// (§4.7 snapshot load).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRecord {
    Marker {
        leadership_term_id: u64,
        log_position: u64,
        begin: bool,
        term_count: u32,
    },
    Session(SessionSnapshotRecord),
    Timer {
        correlation_id: u64,
        deadline: i64,
    },
    SequencerState {
        next_session_id: u64,
    },
}

pub fn decode_record(reader: snapshot_record::Reader) -> ::capnp::Result<SnapshotRecord> {
    match reader.which()? {
        snapshot_record::Marker(r) => {
            let r = r?;
            Ok(SnapshotRecord::Marker {
                leadership_term_id: r.get_leadership_term_id(),
                log_position: r.get_log_position(),
                begin: r.get_begin(),
                term_count: r.get_term_count(),
            })
        }
        snapshot_record::Session(r) => {
            let r = r?;
            Ok(SnapshotRecord::Session(SessionSnapshotRecord {
                session_id: r.get_session_id(),
                response_stream_id: r.get_response_stream_id(),
                response_channel: r.get_response_channel()?.to_string(),
                open_term_position: r.get_open_term_position(),
                time_of_last_activity: r.get_time_of_last_activity(),
            }))
        }
        snapshot_record::Timer(r) => {
            let r = r?;
            Ok(SnapshotRecord::Timer {
                correlation_id: r.get_correlation_id(),
                deadline: r.get_deadline(),
            })
        }
        snapshot_record::SequencerState(r) => {
            let r = r?;
            Ok(SnapshotRecord::SequencerState {
                next_session_id: r.get_next_session_id(),
            })
        }
    }
}

/// The dedicated recorded publication a snapshot is written to (§4.8: "add a
/// new recorded publication"), distinct from the term log.
pub trait SnapshotSink {
    /// Offers one encoded record. Returns `false` on back-pressure, in which
    /// case the caller retries the same record next tick rather than moving
    /// on (§7 class i applies here too).
    fn offer(&mut self, bytes: &[u8]) -> bool;

    fn position(&self) -> u64;
}

/// Reads a snapshot recording back (§4.7), bounded by a fragment limit per
/// poll the way log replay is (§4.4).
pub trait SnapshotSource {
    fn poll(&mut self, limit: usize, on_record: &mut dyn FnMut(SnapshotRecord)) -> usize;

    fn is_closed(&self) -> bool;
}

/// In-memory snapshot source used by tests: records are handed over
/// pre-decoded rather than round-tripped through capnp bytes, mirroring how
/// `MemoryLog` hands over already-built `LogFrame`s.
pub struct MemorySnapshotSource {
    records: Vec<SnapshotRecord>,
    cursor: usize,
}

impl MemorySnapshotSource {
    pub fn new(records: Vec<SnapshotRecord>) -> MemorySnapshotSource {
        MemorySnapshotSource {
            records: records,
            cursor: 0,
        }
    }
}

impl SnapshotSource for MemorySnapshotSource {
    fn poll(&mut self, limit: usize, on_record: &mut dyn FnMut(SnapshotRecord)) -> usize {
        let mut delivered = 0;
        while delivered < limit && self.cursor < self.records.len() {
            let record = self.records[self.cursor].clone();
            self.cursor += 1;
            on_record(record);
            delivered += 1;
        }
        delivered
    }

    fn is_closed(&self) -> bool {
        self.cursor >= self.records.len()
    }
}

/// Drives one OPEN session + the timer service + the id allocator through a
/// `SnapshotSink`, wrapped in marker-begin/marker-end records. Returns
/// `false` the first time `offer` reports back-pressure so the caller can
/// retry starting from wherever it left off; a production implementation
/// would track partial progress across ticks, which this crate models as
/// "retry the whole snapshot" for simplicity, matching the source's
/// single-shot snapshot attempt per SNAPSHOT toggle.
pub fn write_snapshot(
    sink: &mut dyn SnapshotSink,
    leadership_term_id: u64,
    log_position: u64,
    term_count: u32,
    sessions: &[ClusterSession],
    timers: &TimerService,
    next_session_id: u64,
) -> bool {
    if !sink.offer(&encode_marker(leadership_term_id, log_position, true, term_count)) {
        return false;
    }
    for session in sessions {
        if let Some(bytes) = encode_session(session) {
            if !sink.offer(&bytes) {
                return false;
            }
        }
    }
    for bytes in encode_timers(timers) {
        if !sink.offer(&bytes) {
            return false;
        }
    }
    if !sink.offer(&encode_sequencer_state(next_session_id)) {
        return false;
    }
    if !sink.offer(&encode_marker(leadership_term_id, log_position, false, term_count)) {
        return false;
    }
    true
}

/// Pumps `source` until the marker-end record arrives, dispatching each
/// record to `handlers` (§4.7). A session record is translated into a
/// `SessionOpenRecord` and handed to the same `on_replay_session_open` the
/// term-log replay path uses, rather than introducing a parallel session
/// restoration path. Closing before the end marker is a fatal protocol
/// violation, signaled by returning `false`, mirroring `recovery::replay_term`.
pub fn read_snapshot(source: &mut dyn SnapshotSource, handlers: &mut dyn ReplayHandlers) -> bool {
    loop {
        if source.is_closed() {
            return false;
        }
        let mut records = Vec::new();
        source.poll(256, &mut |record| records.push(record));
        if records.is_empty() {
            return false;
        }
        for record in records {
            match record {
                SnapshotRecord::Marker { begin, .. } => {
                    if !begin {
                        return true;
                    }
                }
                SnapshotRecord::Session(session) => {
                    let synthetic = SessionOpenRecord {
                        leadership_term_id: 0,
                        log_position: session.open_term_position,
                        session_id: session.session_id,
                        timestamp: session.time_of_last_activity,
                        response_stream_id: session.response_stream_id,
                        response_channel: session.response_channel,
                    };
                    handlers.on_replay_session_open(&synthetic);
                }
                SnapshotRecord::Timer { correlation_id, deadline } => {
                    handlers.on_reload_timer(correlation_id, deadline);
                }
                SnapshotRecord::SequencerState { next_session_id } => {
                    handlers.on_reload_state(next_session_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct VecSink {
        records: Vec<Vec<u8>>,
    }

    impl SnapshotSink for VecSink {
        fn offer(&mut self, bytes: &[u8]) -> bool {
            self.records.push(bytes.to_vec());
            true
        }

        fn position(&self) -> u64 {
            self.records.len() as u64
        }
    }

    #[test]
    fn writes_markers_around_state() {
        let mut sink = VecSink::default();
        let timers = TimerService::new();
        let ok = write_snapshot(&mut sink, 1, 500, 2, &[], &timers, 9);
        assert!(ok);
        // marker-begin, sequencer_state, marker-end: no open sessions, no timers.
        assert_eq!(sink.records.len(), 3);
    }

    #[test]
    fn marker_round_trips_through_decode() {
        let mut message = Builder::new_default();
        {
            let root = message.init_root::<snapshot_record::Builder>();
            let mut builder = root.init_marker();
            builder.set_leadership_term_id(3);
            builder.set_log_position(50);
            builder.set_begin(true);
            builder.set_term_count(1);
        }
        let reader = message.get_root_as_reader::<snapshot_record::Reader>().unwrap();
        let decoded = decode_record(reader).unwrap();
        assert_eq!(
            decoded,
            SnapshotRecord::Marker {
                leadership_term_id: 3,
                log_position: 50,
                begin: true,
                term_count: 1,
            }
        );
    }

    #[test]
    fn session_round_trips_through_decode() {
        let mut message = Builder::new_default();
        {
            let root = message.init_root::<snapshot_record::Builder>();
            let mut builder = root.init_session();
            builder.set_session_id(7);
            builder.set_response_stream_id(4);
            builder.set_response_channel("responses");
            builder.set_open_term_position(12);
            builder.set_time_of_last_activity(1_000);
        }
        let reader = message.get_root_as_reader::<snapshot_record::Reader>().unwrap();
        let decoded = decode_record(reader).unwrap();
        assert_eq!(
            decoded,
            SnapshotRecord::Session(SessionSnapshotRecord {
                session_id: 7,
                response_stream_id: 4,
                response_channel: "responses".to_string(),
                open_term_position: 12,
                time_of_last_activity: 1_000,
            })
        );
    }

    struct RecordingHandlers {
        opened: Vec<u64>,
        timers: Vec<u64>,
        next_session_id: Option<u64>,
    }

    impl ReplayHandlers for RecordingHandlers {
        fn on_replay_session_open(&mut self, record: &SessionOpenRecord) {
            self.opened.push(record.session_id);
        }
        fn on_replay_session_message(&mut self, _record: &::log_record::SessionMessageRecord) {}
        fn on_replay_session_close(&mut self, _record: &::log_record::SessionCloseRecord) {}
        fn on_replay_timer_event(&mut self, _record: &::log_record::TimerEventRecord) {}
        fn on_replay_cluster_action(&mut self, _record: &::log_record::ClusterActionRecord) {}
        fn on_reload_state(&mut self, next_session_id: u64) {
            self.next_session_id = Some(next_session_id);
        }
        fn on_reload_timer(&mut self, correlation_id: u64, _deadline_ms: i64) {
            self.timers.push(correlation_id);
        }
    }

    #[test]
    fn read_snapshot_dispatches_every_record_then_stops_at_end_marker() {
        let records = vec![
            SnapshotRecord::Marker {
                leadership_term_id: 3,
                log_position: 50,
                begin: true,
                term_count: 1,
            },
            SnapshotRecord::Session(SessionSnapshotRecord {
                session_id: 7,
                response_stream_id: 1,
                response_channel: "r".to_string(),
                open_term_position: 10,
                time_of_last_activity: 900,
            }),
            SnapshotRecord::Timer {
                correlation_id: 5,
                deadline: 2_000,
            },
            SnapshotRecord::SequencerState { next_session_id: 10 },
            SnapshotRecord::Marker {
                leadership_term_id: 3,
                log_position: 50,
                begin: false,
                term_count: 1,
            },
        ];
        let mut source = MemorySnapshotSource::new(records);
        let mut handlers = RecordingHandlers {
            opened: Vec::new(),
            timers: Vec::new(),
            next_session_id: None,
        };
        assert!(read_snapshot(&mut source, &mut handlers));
        assert_eq!(handlers.opened, vec![7]);
        assert_eq!(handlers.timers, vec![5]);
        assert_eq!(handlers.next_session_id, Some(10));
    }
}
