//! End-to-end scenarios driven entirely through `SequencerAgent`'s public
//! API (`start`, `do_work`, `request_control_action`, `write_snapshot`,
//! the read-only accessors) using in-memory collaborator fakes, the same
//! way the library's own `#[cfg(test)]` modules exercise one module at a
//! time but wired up through the whole agent.
//!
//! A three-node, multi-threaded election simulation is deliberately not
//! attempted here: `Collaborators`' fields are `Box<dyn Trait>` and are not
//! `Send`, so driving three agents concurrently would require threading
//! changes with no counterpart in the specification. Instead, election is
//! exercised directly through `start()` for a two-member cluster, with the
//! peer's messages pre-queued.

extern crate cluster_sequencer;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use cluster_sequencer::agent::Collaborators;
use cluster_sequencer::archive::{MemoryArchive, RecordingDescriptor};
use cluster_sequencer::authenticator::AcceptAllAuthenticator;
use cluster_sequencer::clock::EpochClock;
use cluster_sequencer::config::{MemberEndpoints, SequencerConfig};
use cluster_sequencer::control_file::InMemoryControlFile;
use cluster_sequencer::egress::{Egress, EgressErrorCode};
use cluster_sequencer::idle::BusySpinIdleStrategy;
use cluster_sequencer::ingress::{Ingress, IngressAction, IngressEvent};
use cluster_sequencer::log_record::{LogRecord, SessionCloseRecord, SessionOpenRecord};
use cluster_sequencer::log_stream::{AppendResult, Log, LogAdapter, LogAppender, LogFrame, MemoryLog};
use cluster_sequencer::member::{ClusterMember, ClusterMemberTable};
use cluster_sequencer::member_status::{
    AppendedPositionMessage, MemberStatusAdapter, MemberStatusMessage, MemberStatusPublisher,
    RequestVoteMessage, VoteMessage,
};
use cluster_sequencer::recording_log::{MemoryRecordingLog, RecoveryPlan, SnapshotStep, TermStep};
use cluster_sequencer::role::ControlToggle;
use cluster_sequencer::service_control::{JoinLog, ServiceAck, ServiceControlAdapter, ServiceControlPublisher};
use cluster_sequencer::session::CloseReason;
use cluster_sequencer::snapshot::{MemorySnapshotSource, SessionSnapshotRecord, SnapshotRecord};
use cluster_sequencer::termination::RecordingTerminationHook;
use cluster_sequencer::transport::MemoryTransport;
use cluster_sequencer::{ConsensusState, Role, SequencerAgent};

// ---------------------------------------------------------------------
// Shared fixtures
// ---------------------------------------------------------------------

fn endpoints(port: u16) -> MemberEndpoints {
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    MemberEndpoints {
        client_facing: addr,
        member_facing: addr,
        log: addr,
    }
}

fn member_table(ids_and_ports: &[(u64, u16)]) -> ClusterMemberTable {
    let mut table = ClusterMemberTable::new();
    for &(id, port) in ids_and_ports {
        table.insert(ClusterMember::new(id, endpoints(port)));
    }
    table
}

fn config_for(members: &ClusterMemberTable, appointed_leader_id: u64, member_id: u64) -> SequencerConfig {
    let mut map = HashMap::new();
    for m in members.iter() {
        map.insert(m.id(), m.endpoints().clone());
    }
    SequencerConfig::new(
        map,
        appointed_leader_id,
        member_id,
        10,
        Duration::from_millis(5_000),
        Duration::from_millis(1_000),
        Duration::from_millis(5_000),
    )
}

/// Test-local epoch clock a scenario can advance between `do_work` calls.
/// `clock::FakeClock` lives behind `#[cfg(test)]` in the library and so
/// isn't linkable from an external integration test binary.
struct TestClock {
    millis: Cell<i64>,
}

impl TestClock {
    fn new(start_ms: i64) -> Rc<TestClock> {
        Rc::new(TestClock { millis: Cell::new(start_ms) })
    }

    fn advance(&self, delta_ms: i64) {
        self.millis.set(self.millis.get() + delta_ms);
    }
}

/// Wraps the `Rc<TestClock>` so `EpochClock` (a foreign trait, from this
/// test's point of view) can be implemented on it without running afoul of
/// the orphan rules.
struct SharedClock(Rc<TestClock>);

impl EpochClock for SharedClock {
    fn now_ms(&self) -> i64 {
        self.0.millis.get()
    }
}

/// Ingress fake a scenario can keep feeding events into between `do_work`
/// calls, via a shared queue.
#[derive(Clone, Default)]
struct QueueIngress(Rc<RefCell<VecDeque<IngressEvent>>>);

impl QueueIngress {
    fn new() -> QueueIngress {
        QueueIngress::default()
    }

    fn push(&self, event: IngressEvent) {
        self.0.borrow_mut().push_back(event);
    }
}

impl Ingress for QueueIngress {
    fn poll(&mut self, fragment_limit: usize, on_event: &mut dyn FnMut(IngressEvent) -> IngressAction) -> usize {
        let mut delivered = 0;
        while delivered < fragment_limit {
            let event = match self.0.borrow_mut().pop_front() {
                Some(event) => event,
                None => break,
            };
            match on_event(event.clone()) {
                IngressAction::Continue => delivered += 1,
                IngressAction::Abort => {
                    self.0.borrow_mut().push_front(event);
                    break;
                }
            }
        }
        delivered
    }
}

#[derive(Default)]
struct NoopEgress;

impl Egress for NoopEgress {
    fn send_error(&mut self, _session_id: u64, _correlation_id: i64, _code: EgressErrorCode) -> bool {
        true
    }

    fn send_admin_response(&mut self, _session_id: u64, _correlation_id: i64, _detail: &str) -> bool {
        true
    }
}

#[derive(Default)]
struct NoopMemberStatusPublisher;

impl MemberStatusPublisher for NoopMemberStatusPublisher {
    fn send_request_vote(&mut self, _peer_id: u64, _msg: RequestVoteMessage) -> bool {
        true
    }

    fn send_vote(&mut self, _peer_id: u64, _msg: VoteMessage) -> bool {
        true
    }

    fn send_appended_position(&mut self, _leader_id: u64, _msg: AppendedPositionMessage) -> bool {
        true
    }

    fn broadcast_commit_position(&mut self, _msg: cluster_sequencer::member_status::CommitPositionMessage) -> bool {
        true
    }
}

/// Delivers a pre-seeded list of member-status messages in order.
#[derive(Default)]
struct QueueMemberStatusAdapter {
    queue: VecDeque<MemberStatusMessage>,
}

impl QueueMemberStatusAdapter {
    fn new(messages: Vec<MemberStatusMessage>) -> QueueMemberStatusAdapter {
        QueueMemberStatusAdapter {
            queue: messages.into(),
        }
    }
}

impl MemberStatusAdapter for QueueMemberStatusAdapter {
    fn poll(&mut self, limit: usize, on_message: &mut dyn FnMut(MemberStatusMessage)) -> usize {
        let mut delivered = 0;
        while delivered < limit {
            match self.queue.pop_front() {
                Some(message) => {
                    on_message(message);
                    delivered += 1;
                }
                None => break,
            }
        }
        delivered
    }
}

#[derive(Default)]
struct NoopServiceControlPublisher;

impl ServiceControlPublisher for NoopServiceControlPublisher {
    fn publish_join_log(&mut self, _join_log: &JoinLog) -> bool {
        true
    }
}

/// Service-ack adapter a scenario can keep feeding acks into, the way
/// `QueueIngress` does for ingress events.
#[derive(Clone, Default)]
struct QueueServiceControlAdapter(Rc<RefCell<VecDeque<ServiceAck>>>);

impl QueueServiceControlAdapter {
    fn new() -> QueueServiceControlAdapter {
        QueueServiceControlAdapter::default()
    }

    fn push(&self, ack: ServiceAck) {
        self.0.borrow_mut().push_back(ack);
    }
}

impl ServiceControlAdapter for QueueServiceControlAdapter {
    fn poll(&mut self, limit: usize, on_ack: &mut dyn FnMut(ServiceAck)) -> usize {
        let mut delivered = 0;
        while delivered < limit {
            match self.0.borrow_mut().pop_front() {
                Some(ack) => {
                    on_ack(ack);
                    delivered += 1;
                }
                None => break,
            }
        }
        delivered
    }
}

/// A `Log` whose next append at a chosen position fails exactly once with
/// back-pressure. `MemoryLog::fail_next_append_at` is `#[cfg(test)]`-gated
/// in the library and unavailable here, so this crate's back-pressure
/// scenario needs its own.
#[derive(Default)]
struct FlakyLog {
    frames: Vec<LogFrame>,
    read_cursor: usize,
    fail_at: Option<u64>,
}

impl FlakyLog {
    fn new() -> FlakyLog {
        FlakyLog::default()
    }

    fn fail_next_append_at(mut self, position: u64) -> FlakyLog {
        self.fail_at = Some(position);
        self
    }
}

impl LogAppender for FlakyLog {
    fn append(&mut self, record: &LogRecord) -> AppendResult {
        let position = self.frames.len() as u64;
        if self.fail_at == Some(position) {
            self.fail_at = None;
            return AppendResult::BackPressure;
        }
        self.frames.push(LogFrame {
            position: position,
            record: record.clone(),
        });
        AppendResult::Position(position)
    }

    fn position(&self) -> u64 {
        self.frames.len() as u64
    }
}

impl LogAdapter for FlakyLog {
    fn poll(&mut self, limit: usize, on_frame: &mut dyn FnMut(LogFrame)) -> usize {
        let mut delivered = 0;
        while delivered < limit && self.read_cursor < self.frames.len() {
            let frame = self.frames[self.read_cursor].clone();
            self.read_cursor += 1;
            on_frame(frame);
            delivered += 1;
        }
        delivered
    }

    fn position(&self) -> u64 {
        self.read_cursor as u64
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// A `Log` standing in for a recording-archive replay image: its position
/// starts at `start_position` (an absolute stream position) rather than 0,
/// matching how a real replay image reports position (§4.7).
struct ReplayLog {
    start_position: u64,
    records: VecDeque<LogRecord>,
    delivered: u64,
}

impl ReplayLog {
    fn new(start_position: u64, records: Vec<LogRecord>) -> ReplayLog {
        ReplayLog {
            start_position: start_position,
            records: records.into(),
            delivered: 0,
        }
    }
}

impl LogAppender for ReplayLog {
    fn append(&mut self, _record: &LogRecord) -> AppendResult {
        AppendResult::BackPressure
    }

    fn position(&self) -> u64 {
        self.start_position + self.delivered
    }
}

impl LogAdapter for ReplayLog {
    fn poll(&mut self, limit: usize, on_frame: &mut dyn FnMut(LogFrame)) -> usize {
        let mut delivered = 0;
        while delivered < limit {
            match self.records.pop_front() {
                Some(record) => {
                    let position = self.start_position + self.delivered;
                    self.delivered += 1;
                    on_frame(LogFrame {
                        position: position,
                        record: record,
                    });
                    delivered += 1;
                }
                None => break,
            }
        }
        delivered
    }

    fn position(&self) -> u64 {
        self.start_position + self.delivered
    }

    fn is_closed(&self) -> bool {
        false
    }
}

fn make_collaborators(
    clock: Box<dyn EpochClock>,
    log: Box<dyn Log>,
    ingress: Box<dyn Ingress>,
    member_status_publisher: Box<dyn MemberStatusPublisher>,
    member_status_adapter: Box<dyn MemberStatusAdapter>,
    service_control_adapter: Box<dyn ServiceControlAdapter>,
) -> Collaborators {
    Collaborators {
        clock: clock,
        idle: Box::new(BusySpinIdleStrategy::default()),
        authenticator: Box::new(AcceptAllAuthenticator::default()),
        termination_hook: Box::new(RecordingTerminationHook::default()),
        archive: Box::new(MemoryArchive::new()),
        recording_log: Box::new(MemoryRecordingLog::new()),
        log: log,
        snapshot_log: Box::new(MemorySnapshotSource::new(Vec::new())),
        member_status_publisher: member_status_publisher,
        member_status_adapter: member_status_adapter,
        service_control_publisher: Box::new(NoopServiceControlPublisher::default()),
        service_control_adapter: service_control_adapter,
        ingress: ingress,
        egress: Box::new(NoopEgress::default()),
        control_file: Box::new(InMemoryControlFile::default()),
        transport: Box::new(MemoryTransport::new()),
    }
}

// ---------------------------------------------------------------------
// Scenario 1: single-node cold start
// ---------------------------------------------------------------------

#[test]
fn single_node_cold_start_becomes_leader() {
    let members = member_table(&[(1, 7001)]);
    let config = config_for(&members, 1, 1);
    let clock = TestClock::new(0);

    let collaborators = make_collaborators(
        Box::new(SharedClock(clock.clone())),
        Box::new(MemoryLog::new()),
        Box::new(QueueIngress::new()),
        Box::new(NoopMemberStatusPublisher::default()),
        Box::new(QueueMemberStatusAdapter::new(Vec::new())),
        Box::new(QueueServiceControlAdapter::new()),
    );

    let mut agent = SequencerAgent::new(config, RecoveryPlan::default(), 0, members, collaborators);
    agent.start().expect("single-node start should never hit a fatal path");

    assert_eq!(agent.role(), Role::Leader);
    assert_eq!(agent.consensus_state(), ConsensusState::Active);
    assert_eq!(agent.leadership_term_id(), 1);
    assert!(agent.is_recovered());
    assert_eq!(agent.base_log_position(), 0);
}

// ---------------------------------------------------------------------
// Scenario 2: client session lifecycle
// ---------------------------------------------------------------------

#[test]
fn session_connects_authenticates_and_opens_in_one_tick() {
    let members = member_table(&[(1, 7002)]);
    let config = config_for(&members, 1, 1);
    let clock = TestClock::new(0);
    let ingress = QueueIngress::new();

    let collaborators = make_collaborators(
        Box::new(SharedClock(clock.clone())),
        Box::new(MemoryLog::new()),
        Box::new(ingress.clone()),
        Box::new(NoopMemberStatusPublisher::default()),
        Box::new(QueueMemberStatusAdapter::new(Vec::new())),
        Box::new(QueueServiceControlAdapter::new()),
    );

    let mut agent = SequencerAgent::new(config, RecoveryPlan::default(), 0, members, collaborators);
    agent.start().expect("single-node start should never hit a fatal path");

    ingress.push(IngressEvent::SessionConnect {
        correlation_id: 1,
        response_stream_id: 5,
        response_channel: "client-1".to_string(),
        credentials: Vec::new(),
    });
    clock.advance(1);
    let work = agent.do_work();
    assert!(work > 0);
    assert_eq!(agent.sessions().open_sessions().len(), 1);
    let session_id = *agent.sessions().open_sessions().keys().next().unwrap();
    assert!(agent.sessions().open_sessions().get(&session_id).unwrap().is_open());

    ingress.push(IngressEvent::SessionMessage {
        session_id: session_id,
        correlation_id: 2,
        payload: vec![1, 2, 3],
    });
    clock.advance(1);
    let work = agent.do_work();
    assert!(work > 0);
    assert_eq!(agent.sessions().open_sessions().len(), 1);

    ingress.push(IngressEvent::SessionClose { session_id: session_id });
    clock.advance(1);
    agent.do_work();
    assert_eq!(agent.sessions().open_sessions().len(), 0);
}

// ---------------------------------------------------------------------
// Scenario 3: back-pressure on append is retried, not dropped
// ---------------------------------------------------------------------

#[test]
fn session_open_retries_after_log_back_pressure() {
    let members = member_table(&[(1, 7003)]);
    let config = config_for(&members, 1, 1);
    let clock = TestClock::new(0);
    let ingress = QueueIngress::new();

    let collaborators = make_collaborators(
        Box::new(SharedClock(clock.clone())),
        Box::new(FlakyLog::new().fail_next_append_at(0)),
        Box::new(ingress.clone()),
        Box::new(NoopMemberStatusPublisher::default()),
        Box::new(QueueMemberStatusAdapter::new(Vec::new())),
        Box::new(QueueServiceControlAdapter::new()),
    );

    let mut agent = SequencerAgent::new(config, RecoveryPlan::default(), 0, members, collaborators);
    agent.start().expect("single-node start should never hit a fatal path");

    ingress.push(IngressEvent::SessionConnect {
        correlation_id: 1,
        response_stream_id: 5,
        response_channel: "client-1".to_string(),
        credentials: Vec::new(),
    });

    clock.advance(1);
    agent.do_work();
    assert_eq!(agent.sessions().open_sessions().len(), 0);
    assert_eq!(agent.sessions().pending_len(), 1);

    clock.advance(1);
    agent.do_work();
    assert_eq!(agent.sessions().open_sessions().len(), 1);
    assert_eq!(agent.sessions().pending_len(), 0);
}

// ---------------------------------------------------------------------
// Scenario 4: SNAPSHOT control-toggle round trip
// ---------------------------------------------------------------------

#[test]
fn snapshot_toggle_drives_consensus_state_through_snapshot_and_back() {
    let members = member_table(&[(1, 7004)]);
    let config = config_for(&members, 1, 1);
    let clock = TestClock::new(0);
    let service_acks = QueueServiceControlAdapter::new();

    // Satisfies `become_leader`'s `await_service_acks` during start().
    service_acks.push(ServiceAck {
        log_position: 0,
        leadership_term_id: 1,
        service_id: 0,
        action: None,
    });

    let collaborators = make_collaborators(
        Box::new(SharedClock(clock.clone())),
        Box::new(MemoryLog::new()),
        Box::new(QueueIngress::new()),
        Box::new(NoopMemberStatusPublisher::default()),
        Box::new(QueueMemberStatusAdapter::new(Vec::new())),
        Box::new(service_acks.clone()),
    );

    let mut agent = SequencerAgent::new(config, RecoveryPlan::default(), 1, members, collaborators);
    agent.start().expect("single-node start should never hit a fatal path");
    assert_eq!(agent.consensus_state(), ConsensusState::Active);

    agent.request_control_action(ControlToggle::Snapshot);
    clock.advance(1);
    agent.do_work();
    assert_eq!(agent.consensus_state(), ConsensusState::Snapshot);

    // The cluster-action record landed at log position 0 and advanced the
    // log to position 1; the service ack must report that position back.
    service_acks.push(ServiceAck {
        log_position: 1,
        leadership_term_id: 1,
        service_id: 0,
        action: Some(ControlToggle::Snapshot),
    });
    clock.advance(1);
    agent.do_work();
    assert_eq!(agent.consensus_state(), ConsensusState::Active);
    assert_eq!(agent.snapshot_count(), 1);
}

// ---------------------------------------------------------------------
// Scenario 5: two-member appointed-leader election
// ---------------------------------------------------------------------

#[test]
fn two_member_appointed_leader_reaches_active_after_election() {
    let members = member_table(&[(1, 7005), (2, 7006)]);
    let config = config_for(&members, 1, 1);
    let clock = TestClock::new(0);

    // First consumed by `run_election`'s vote-collection loop, then (once
    // that loop has the quorum it needs) the remaining message is consumed
    // by `become_leader`'s "await a quorum of followers reporting in" loop.
    let member_status_adapter = QueueMemberStatusAdapter::new(vec![
        MemberStatusMessage::Vote(VoteMessage {
            term_id: 1,
            last_base_log_position: 0,
            last_term_position: 0,
            candidate_id: 1,
            follower_id: 2,
            vote_granted: true,
        }),
        MemberStatusMessage::AppendedPosition(AppendedPositionMessage {
            term_position: 0,
            term_id: 1,
            follower_id: 2,
        }),
    ]);

    let collaborators = make_collaborators(
        Box::new(SharedClock(clock.clone())),
        Box::new(MemoryLog::new()),
        Box::new(QueueIngress::new()),
        Box::new(NoopMemberStatusPublisher::default()),
        Box::new(member_status_adapter),
        Box::new(QueueServiceControlAdapter::new()),
    );

    let mut agent = SequencerAgent::new(config, RecoveryPlan::default(), 0, members, collaborators);
    agent.start().expect("two-member election should reach ACTIVE without a fatal path");

    assert_eq!(agent.role(), Role::Leader);
    assert_eq!(agent.consensus_state(), ConsensusState::Active);
    assert_eq!(agent.leadership_term_id(), 1);
}

// ---------------------------------------------------------------------
// Scenario 6: crash recovery from a snapshot plus one term of replay
// ---------------------------------------------------------------------

#[test]
fn recovers_from_snapshot_and_replays_one_term() {
    let members = member_table(&[(1, 7007)]);
    let config = config_for(&members, 1, 1);
    let clock = TestClock::new(0);

    let recovery_plan = RecoveryPlan {
        snapshot: Some(SnapshotStep {
            recording_id: 9,
            log_position: 50,
            leadership_term_id: 3,
            timestamp: 1_000,
            term_position: 50,
        }),
        terms: vec![TermStep {
            recording_id: 7,
            start_position: 50,
            stop_position: Some(52),
            log_position: 50,
            leadership_term_id: 4,
        }],
    };

    // The snapshot recording holds two sessions still open when it was
    // taken (7 and 9) and the allocator's next id (10). The one term of log
    // replay after it closes session 7 and opens a new session 11, landing
    // at the canonical {9, 11} / next_session_id=12 outcome.
    let snapshot_records = vec![
        SnapshotRecord::Marker {
            leadership_term_id: 3,
            log_position: 50,
            begin: true,
            term_count: 1,
        },
        SnapshotRecord::Session(SessionSnapshotRecord {
            session_id: 7,
            response_stream_id: 5,
            response_channel: "client-7".to_string(),
            open_term_position: 40,
            time_of_last_activity: 900,
        }),
        SnapshotRecord::Session(SessionSnapshotRecord {
            session_id: 9,
            response_stream_id: 6,
            response_channel: "client-9".to_string(),
            open_term_position: 45,
            time_of_last_activity: 950,
        }),
        SnapshotRecord::SequencerState { next_session_id: 10 },
        SnapshotRecord::Marker {
            leadership_term_id: 3,
            log_position: 50,
            begin: false,
            term_count: 1,
        },
    ];

    let term_records = vec![
        LogRecord::SessionClose(SessionCloseRecord {
            leadership_term_id: 4,
            log_position: 50,
            session_id: 7,
            timestamp: 2_000,
            reason: CloseReason::Timeout,
        }),
        LogRecord::SessionOpen(SessionOpenRecord {
            leadership_term_id: 4,
            log_position: 51,
            session_id: 11,
            timestamp: 2_100,
            response_stream_id: 9,
            response_channel: "client-11".to_string(),
        }),
    ];

    let mut archive = MemoryArchive::new();
    archive.seed_recording(RecordingDescriptor {
        recording_id: 9,
        start_position: 0,
        stop_position: None,
    });

    let collaborators = Collaborators {
        clock: Box::new(SharedClock(clock.clone())),
        idle: Box::new(BusySpinIdleStrategy::default()),
        authenticator: Box::new(AcceptAllAuthenticator::default()),
        termination_hook: Box::new(RecordingTerminationHook::default()),
        archive: Box::new(archive),
        recording_log: Box::new(MemoryRecordingLog::new()),
        log: Box::new(ReplayLog::new(50, term_records)),
        snapshot_log: Box::new(MemorySnapshotSource::new(snapshot_records)),
        member_status_publisher: Box::new(NoopMemberStatusPublisher::default()),
        member_status_adapter: Box::new(QueueMemberStatusAdapter::new(Vec::new())),
        service_control_publisher: Box::new(NoopServiceControlPublisher::default()),
        service_control_adapter: Box::new(QueueServiceControlAdapter::new()),
        ingress: Box::new(QueueIngress::new()),
        egress: Box::new(NoopEgress::default()),
        control_file: Box::new(InMemoryControlFile::default()),
        transport: Box::new(MemoryTransport::new()),
    };

    let mut agent = SequencerAgent::new(config, recovery_plan, 0, members, collaborators);
    agent.start().expect("recovery from snapshot plus one term should succeed");

    assert!(agent.is_recovered());
    assert_eq!(agent.leadership_term_id(), 5);
    assert_eq!(agent.base_log_position(), 52);

    let mut open_ids: Vec<u64> = agent.sessions().open_sessions().keys().cloned().collect();
    open_ids.sort();
    assert_eq!(open_ids, vec![9, 11]);
    assert_eq!(agent.sessions().next_session_id(), 12);

    let session_9 = agent.sessions().open_sessions().get(&9).expect("session 9 should have survived replay");
    assert!(session_9.is_open());
    let session_11 = agent.sessions().open_sessions().get(&11).expect("session 11 should have been replayed");
    assert!(session_11.is_open());
}
