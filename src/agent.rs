//! The sequencer agent itself (§4.1-§4.8): core tick loop, role state
//! machine, election, client session pipeline, log sequencing, cluster
//! actions, recovery and snapshotting. This is the orchestration layer —
//! every other module in this crate is a leaf it composes.

use std::collections::HashSet;

use archive::RecordingArchive;
use authenticator::Authenticator;
use clock::EpochClock;
use config::SequencerConfig;
use control_file::ControlFile;
use counters::{PositionCounter, StateCounter};
use egress::{Egress, EgressErrorCode};
use error::{FatalReason, Result, SequencerError};
use idle::IdleStrategy;
use ingress::{AdminQueryKind, Ingress, IngressAction, IngressEvent};
use log_stream::{AppendResult, Log, LogAdapter, LogAppender};
use log_record::{
    ClusterActionRecord, LogRecord, SessionCloseRecord, SessionMessageRecord, SessionOpenRecord, TimerEventRecord,
};
use member::ClusterMemberTable;
use member_status::{
    AppendedPositionMessage, CommitPositionMessage, MemberStatusAdapter, MemberStatusMessage, MemberStatusPublisher,
    RequestVoteMessage, VoteMessage,
};
use recording_log::{RecordingLog, RecoveryPlan, SnapshotStep, TermStep};
use recovery::{self, ReplayHandlers};
use role::{self, ConsensusState, ControlToggle, Role};
use service_control::{JoinLog, ServiceAck, ServiceAckCounter, ServiceControlAdapter, ServiceControlPublisher};
use session::{CloseReason, ClusterSession, RejectReason, SessionState, SessionTable};
use snapshot::{SnapshotSink, SnapshotSource};
use termination::{TerminationHook, TerminationReason};
use timer::TimerService;
use transport::Transport;

/// Everything the agent needs from the outside world, grouped so
/// `SequencerAgent::new` doesn't take two dozen bare parameters. Every field
/// is a trait object, per the design note on dynamic dispatch (§9): the
/// concrete collaborator is chosen once at construction and never
/// downcast.
pub struct Collaborators {
    pub clock: Box<dyn EpochClock>,
    pub idle: Box<dyn IdleStrategy>,
    pub authenticator: Box<dyn Authenticator>,
    pub termination_hook: Box<dyn TerminationHook>,
    pub archive: Box<dyn RecordingArchive>,
    pub recording_log: Box<dyn RecordingLog>,
    pub log: Box<dyn Log>,
    pub snapshot_log: Box<dyn SnapshotSource>,
    pub member_status_publisher: Box<dyn MemberStatusPublisher>,
    pub member_status_adapter: Box<dyn MemberStatusAdapter>,
    pub service_control_publisher: Box<dyn ServiceControlPublisher>,
    pub service_control_adapter: Box<dyn ServiceControlAdapter>,
    pub ingress: Box<dyn Ingress>,
    pub egress: Box<dyn Egress>,
    pub control_file: Box<dyn ControlFile>,
    pub transport: Box<dyn Transport>,
}

/// Placeholder stood in for `Collaborators::ingress` while it is temporarily
/// moved out of the struct (see `SequencerAgent::poll_ingress`). Never
/// retained across a tick.
struct NullIngress;

impl Ingress for NullIngress {
    fn poll(&mut self, _fragment_limit: usize, _on_event: &mut dyn FnMut(IngressEvent) -> IngressAction) -> usize {
        0
    }
}

/// Placeholder stood in for `Collaborators::log` while it is temporarily
/// moved out of the struct (see `SequencerAgent::recover_term`).
struct NullLog;

impl LogAppender for NullLog {
    fn append(&mut self, _record: &LogRecord) -> AppendResult {
        AppendResult::BackPressure
    }

    fn position(&self) -> u64 {
        0
    }
}

impl LogAdapter for NullLog {
    fn poll(&mut self, _limit: usize, _on_frame: &mut dyn FnMut(::log_stream::LogFrame)) -> usize {
        0
    }

    fn position(&self) -> u64 {
        0
    }

    fn is_closed(&self) -> bool {
        true
    }
}

/// Placeholder stood in for `Collaborators::snapshot_log` while it is
/// temporarily moved out of the struct (see
/// `SequencerAgent::recover_from_snapshot`). Never retained across a tick.
struct NullSnapshotSource;

impl SnapshotSource for NullSnapshotSource {
    fn poll(&mut self, _limit: usize, _on_record: &mut dyn FnMut(::snapshot::SnapshotRecord)) -> usize {
        0
    }

    fn is_closed(&self) -> bool {
        true
    }
}

const NULL_LOG_SESSION_ID: i64 = -1;
const LOG_STREAM_ID: i32 = 10;
const INGRESS_FRAGMENT_LIMIT: usize = 64;
const REPLAY_FRAGMENT_LIMIT: usize = 256;
const MEMBER_STATUS_FRAGMENT_LIMIT: usize = 16;
const MEMBER_STATUS_STREAM_ID: i32 = 11;

/// Per-node control loop, driven by repeated calls to `do_work` (§4.1).
pub struct SequencerAgent {
    config: SequencerConfig,
    recovery_plan: RecoveryPlan,
    service_count: usize,

    role: Role,
    consensus_state: ConsensusState,
    leader_member_id: Option<u64>,
    voted_for_member_id: Option<u64>,
    leadership_term_id: u64,
    base_log_position: u64,
    follower_commit_position: Option<u64>,
    time_of_last_log_update_ms: i64,
    is_recovered: bool,
    log_session_id: Option<i64>,
    log_recording_id: Option<i64>,
    control_toggle: ControlToggle,
    snapshot_count: u64,

    sessions: SessionTable,
    timers: TimerService,
    members: ClusterMemberTable,
    failed_timer_cancellations: Vec<u64>,
    service_acks: ServiceAckCounter,

    commit_position_counter: PositionCounter,
    recording_position_counter: PositionCounter,
    role_counter: StateCounter,
    module_state_counter: StateCounter,

    cached_now_ms: i64,

    collaborators: Collaborators,
}

impl SequencerAgent {
    pub fn new(
        config: SequencerConfig,
        recovery_plan: RecoveryPlan,
        service_count: usize,
        members: ClusterMemberTable,
        collaborators: Collaborators,
    ) -> SequencerAgent {
        let now_ms = collaborators.clock.now_ms();
        SequencerAgent {
            config: config,
            recovery_plan: recovery_plan,
            service_count: service_count,
            role: Role::Follower,
            consensus_state: ConsensusState::Init,
            leader_member_id: None,
            voted_for_member_id: None,
            leadership_term_id: 0,
            base_log_position: 0,
            follower_commit_position: None,
            time_of_last_log_update_ms: now_ms,
            is_recovered: false,
            log_session_id: None,
            log_recording_id: None,
            control_toggle: ControlToggle::Neutral,
            snapshot_count: 0,
            sessions: SessionTable::new(),
            timers: TimerService::new(),
            members: members,
            failed_timer_cancellations: Vec::new(),
            service_acks: ServiceAckCounter::new(service_count),
            commit_position_counter: PositionCounter::new(0),
            recording_position_counter: PositionCounter::new(0),
            role_counter: StateCounter::new(Role::Follower.code()),
            module_state_counter: StateCounter::new(ConsensusState::Init.code()),
            cached_now_ms: now_ms,
            collaborators: collaborators,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn consensus_state(&self) -> ConsensusState {
        self.consensus_state
    }

    /// Externally observable mirror of `role` (§9 "Shared counters").
    pub fn role_counter(&self) -> i64 {
        self.role_counter.get()
    }

    /// Externally observable mirror of `consensus_state` (§9 "Shared
    /// counters").
    pub fn module_state_counter(&self) -> i64 {
        self.module_state_counter.get()
    }

    /// Moves `role` to `to`, keeping `role_counter` in lockstep. Only
    /// asserts the transition table (§9/§4.2) on an actual change so a
    /// same-role call (e.g. the single-node startup path settling back on
    /// `Follower`) is always a harmless no-op.
    fn set_role(&mut self, to: Role) {
        if self.role != to {
            debug_assert!(
                role::role_transition_allowed(
                    self.role,
                    to,
                    self.config.appointed_leader_id() == self.config.member_id(),
                    self.config.cluster_size(),
                ),
                "illegal role transition {:?} -> {:?}",
                self.role,
                to
            );
        }
        self.role = to;
        self.role_counter.set(to.code());
    }

    /// Moves `consensus_state` to `to`, keeping `module_state_counter` in
    /// lockstep.
    fn set_consensus_state(&mut self, to: ConsensusState) {
        self.consensus_state = to;
        self.module_state_counter.set(to.code());
    }

    pub fn leadership_term_id(&self) -> u64 {
        self.leadership_term_id
    }

    pub fn base_log_position(&self) -> u64 {
        self.base_log_position
    }

    pub fn is_recovered(&self) -> bool {
        self.is_recovered
    }

    pub fn snapshot_count(&self) -> u64 {
        self.snapshot_count
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    fn idle_tick(&mut self) {
        self.collaborators.idle.idle(0);
    }

    // ---------------------------------------------------------------
    // §4.2 Startup sequence
    // ---------------------------------------------------------------

    /// Drives the full startup sequence: recovery, term increment, election,
    /// and the leader/follower split. Must be called exactly once before
    /// the first `do_work`.
    pub fn start(&mut self) -> Result<()> {
        info!("sequencer starting up, member_id={}", self.config.member_id());

        // Replay session ids are assigned across the whole recovery
        // sequence (§4.7), so a leading snapshot replay claims index 0 and
        // every term step's expected index shifts by one.
        let snapshot = self.recovery_plan.snapshot;
        let replay_index_offset = if let Some(snapshot) = snapshot {
            self.recover_from_snapshot(snapshot)?;
            1
        } else {
            0
        };

        let term_steps = self.recovery_plan.terms.clone();
        for (index, step) in term_steps.into_iter().enumerate() {
            self.recover_term(replay_index_offset + index as u64, step)?;
        }

        self.is_recovered = true;
        self.set_consensus_state(ConsensusState::Active);
        self.leadership_term_id += 1;

        if self.config.cluster_size() > 1 {
            self.run_election()?;
        } else {
            self.set_role(Role::Follower); // becomes Leader below via the size==1 edge in role::role_transition_allowed
            self.leader_member_id = Some(self.config.member_id());
        }

        if self.leader_member_id == Some(self.config.member_id()) {
            self.become_leader()?;
        } else {
            self.become_follower()?;
        }

        self.collaborators
            .recording_log
            .append_term(self.leadership_term_id, self.base_log_position, self.cached_now_ms);

        info!(
            "sequencer active: role={:?} term={} base_log_position={}",
            self.role, self.leadership_term_id, self.base_log_position
        );
        Ok(())
    }

    fn run_election(&mut self) -> Result<()> {
        self.connect_member_publications();
        while !self.members.all_connected() {
            self.idle_tick();
        }

        if self.config.appointed_leader_id() == self.config.member_id() {
            self.set_role(Role::Candidate);
            self.voted_for_member_id = Some(self.config.member_id());
            if let Some(m) = self.members.get_mut(self.config.member_id()) {
                m.set_voted_for_id(Some(self.config.member_id()));
            }

            let vote_request = RequestVoteMessage {
                term_id: self.leadership_term_id,
                last_base_log_position: self.recovery_plan.last_log_position(),
                last_term_position: self.recovery_plan.last_term_position_appended(),
                candidate_id: self.config.member_id(),
            };

            for peer_id in self.members.ids() {
                if peer_id == self.config.member_id() {
                    continue;
                }
                if !self.collaborators.member_status_publisher.send_request_vote(peer_id, vote_request) {
                    return Err(SequencerError::Fatal(FatalReason::RequestVoteSendFailed { peer_id: peer_id }));
                }
            }

            while !self.members.all_voted() {
                let mut messages = Vec::new();
                self.collaborators
                    .member_status_adapter
                    .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |m| messages.push(m));
                for msg in messages {
                    if let MemberStatusMessage::Vote(v) = msg {
                        if v.term_id == self.leadership_term_id {
                            if let Some(m) = self.members.get_mut(v.follower_id) {
                                m.set_voted_for_id(Some(v.candidate_id));
                            }
                            continue;
                        }
                    }
                    self.handle_member_status_message(msg);
                }
                self.idle_tick();
            }
            self.leader_member_id = Some(self.config.member_id());
        } else {
            while self.leader_member_id.is_none() {
                let mut messages = Vec::new();
                self.collaborators
                    .member_status_adapter
                    .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |m| messages.push(m));
                for msg in messages {
                    self.handle_member_status_message(msg);
                }
                self.idle_tick();
            }
        }
        Ok(())
    }

    /// Opens a member-status publication to every member that doesn't have
    /// one yet (§4.2 "await all peer publications connected"). Grounds
    /// `ClusterMember::is_connected` in an actual capability rather than
    /// leaving it permanently unset.
    fn connect_member_publications(&mut self) {
        for id in self.members.ids() {
            let needs_publication = self.members.get(id).map_or(false, |m| !m.is_connected());
            if needs_publication {
                let handle = self
                    .collaborators
                    .transport
                    .add_publication("member-status", MEMBER_STATUS_STREAM_ID);
                if let Some(m) = self.members.get_mut(id) {
                    m.connect_publication(handle);
                }
            }
        }
    }

    fn become_leader(&mut self) -> Result<()> {
        self.set_role(Role::Leader);
        if let Some(m) = self.members.get_mut(self.config.member_id()) {
            m.set_is_leader(true);
        }
        self.leader_member_id = Some(self.config.member_id());

        let (_publication, recording_id) = self
            .collaborators
            .archive
            .add_recorded_exclusive_publication("log", LOG_STREAM_ID);
        self.log_recording_id = Some(recording_id);
        self.log_session_id = Some(self.config.member_id() as i64);
        self.recording_position_counter.set(0);
        self.commit_position_counter.set(0);

        let join = JoinLog {
            leadership_term_id: self.leadership_term_id,
            commit_position_counter_id: 0,
            session_id: self.log_session_id.unwrap_or(NULL_LOG_SESSION_ID),
            stream_id: LOG_STREAM_ID,
            channel: "log".to_string(),
        };
        while !self.collaborators.service_control_publisher.publish_join_log(&join) {
            self.idle_tick();
        }
        self.await_service_acks()?;

        // Await a quorum of members (including self) to have reported in at
        // least once, heartbeat-driven. This deliberately counts *reports*,
        // not *positions*: a fresh cluster's followers start at position 0
        // too, so gating on `quorum_position() > 0` here would never clear
        // (§9 "Shared counters": position 0 is a legitimate steady-state
        // value, not an absence marker).
        let mut reported: HashSet<u64> = HashSet::new();
        reported.insert(self.config.member_id());
        while self.members.len() > 1 && reported.len() < self.members.quorum_size() {
            self.broadcast_commit_position();
            let mut messages = Vec::new();
            self.collaborators
                .member_status_adapter
                .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |m| messages.push(m));
            for msg in messages {
                if let MemberStatusMessage::AppendedPosition(ap) = msg {
                    if let Some(m) = self.members.get_mut(ap.follower_id) {
                        m.set_term_position(ap.term_position);
                    }
                    reported.insert(ap.follower_id);
                    continue;
                }
                self.handle_member_status_message(msg);
            }
            self.idle_tick();
        }

        for session in self.sessions.open_sessions_mut().values_mut() {
            session.set_response_connected(true);
            session.touch(self.cached_now_ms);
        }
        Ok(())
    }

    fn become_follower(&mut self) -> Result<()> {
        self.set_role(Role::Follower);
        while self.follower_commit_position.is_none() {
            let mut messages = Vec::new();
            self.collaborators
                .member_status_adapter
                .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |m| messages.push(m));
            for msg in messages {
                self.handle_member_status_message(msg);
            }
            self.idle_tick();
        }

        // Start archive recording of the leader's log (remote source).
        self.collaborators.archive.start_recording("log", LOG_STREAM_ID, 0);
        self.recording_position_counter.set(0);
        self.commit_position_counter.set(0);

        let join = JoinLog {
            leadership_term_id: self.leadership_term_id,
            commit_position_counter_id: 0,
            session_id: self.log_session_id.unwrap_or(NULL_LOG_SESSION_ID),
            stream_id: LOG_STREAM_ID,
            channel: "log".to_string(),
        };
        while !self.collaborators.service_control_publisher.publish_join_log(&join) {
            self.idle_tick();
        }
        self.await_service_acks()?;
        Ok(())
    }

    fn await_service_acks(&mut self) -> Result<()> {
        self.service_acks.reset();
        while !self.service_acks.is_complete() {
            let mut acks = Vec::new();
            self.collaborators
                .service_control_adapter
                .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |ack| acks.push(ack));
            for ack in acks {
                if self.service_acks.record().is_err() {
                    return Err(SequencerError::Fatal(FatalReason::AckCountExceedsServiceCount {
                        expected: self.service_acks.service_count(),
                        got: self.service_acks.count() + 1,
                    }));
                }
            }
            if !self.service_acks.is_complete() {
                self.idle_tick();
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // §4.1 Core tick
    // ---------------------------------------------------------------

    /// Performs one tick and returns a non-negative work count, per §4.1.
    pub fn do_work(&mut self) -> i32 {
        let now_ms = self.collaborators.clock.now_ms();
        let is_slow_tick = now_ms != self.cached_now_ms;
        self.cached_now_ms = now_ms;

        let mut work = 0;

        match (self.role, self.consensus_state) {
            (Role::Leader, ConsensusState::Active) => {
                work += self.poll_ingress();
            }
            (Role::Follower, ConsensusState::Active) | (Role::Follower, ConsensusState::Suspended) => {
                work += self.poll_log_replay();
            }
            _ => {}
        }

        work += self.poll_member_status();
        self.advance_position_reporting();

        if is_slow_tick {
            self.collaborators.control_file.update_activity_timestamp(now_ms);
            work += self.poll_service_control();

            if self.role == Role::Leader && self.consensus_state == ConsensusState::Active {
                self.process_control_toggle();
                work += self.pump_pending_sessions();
                self.session_housekeeping();
                work += self.pump_rejected_sessions();
                work += self.poll_timers();
            }
        }

        work
    }

    fn poll_ingress(&mut self) -> i32 {
        // Swap the ingress collaborator out for the duration of the poll so
        // the dispatch closure can borrow the rest of `self` freely; this is
        // the same "lend the field to itself" trick `poll_log_replay` avoids
        // needing only because the log adapter never needs to call back into
        // the agent mid-poll the way ingress dispatch does.
        let mut ingress: Box<dyn Ingress> = ::std::mem::replace(&mut self.collaborators.ingress, Box::new(NullIngress));
        let delivered = ingress.poll(INGRESS_FRAGMENT_LIMIT, &mut |event| self.dispatch_ingress_event(event));
        self.collaborators.ingress = ingress;
        delivered as i32
    }

    fn dispatch_ingress_event(&mut self, event: IngressEvent) -> IngressAction {
        match event {
            IngressEvent::SessionConnect {
                correlation_id,
                response_stream_id,
                response_channel,
                credentials,
            } => {
                self.on_session_connect(correlation_id, response_stream_id, response_channel, &credentials);
                IngressAction::Continue
            }
            IngressEvent::ChallengeResponse {
                correlation_id,
                session_id,
                credentials,
            } => {
                self.on_challenge_response(correlation_id, session_id, &credentials);
                IngressAction::Continue
            }
            IngressEvent::SessionMessage {
                session_id,
                correlation_id,
                payload,
            } => self.on_session_message(session_id, correlation_id, payload),
            IngressEvent::KeepAlive { session_id } => {
                self.on_keep_alive(session_id);
                IngressAction::Continue
            }
            IngressEvent::SessionClose { session_id } => {
                self.on_session_close(session_id);
                IngressAction::Continue
            }
            IngressEvent::AdminQuery {
                session_id,
                correlation_id,
                kind,
            } => {
                self.on_admin_query(session_id, correlation_id, kind);
                IngressAction::Continue
            }
        }
    }

    fn poll_log_replay(&mut self) -> i32 {
        if let Some(limit) = self.follower_commit_position {
            let mut frames = Vec::new();
            self.collaborators.log.poll(REPLAY_FRAGMENT_LIMIT, &mut |frame| {
                if frame.position < limit {
                    frames.push(frame);
                }
            });
            let delivered = frames.len();
            for frame in &frames {
                recovery::dispatch_frame(frame, self);
            }
            self.commit_position_counter.advance(self.collaborators.log.position() as i64);
            delivered as i32
        } else {
            0
        }
    }

    fn poll_member_status(&mut self) -> i32 {
        let mut messages = Vec::new();
        let delivered = self
            .collaborators
            .member_status_adapter
            .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |m| messages.push(m));
        for msg in messages {
            self.handle_member_status_message(msg);
        }
        delivered as i32
    }

    fn poll_service_control(&mut self) -> i32 {
        let mut acks = Vec::new();
        let delivered = self
            .collaborators
            .service_control_adapter
            .poll(MEMBER_STATUS_FRAGMENT_LIMIT, &mut |ack| acks.push(ack));
        for ack in acks {
            self.process_service_ack(ack);
        }
        delivered as i32
    }

    fn advance_position_reporting(&mut self) {
        match self.role {
            Role::Leader => {
                let recording_position = self.collaborators.log.position();
                self.recording_position_counter.set(recording_position as i64);
                if let Some(m) = self.members.get_mut(self.config.member_id()) {
                    m.set_term_position(recording_position);
                }
                let quorum_position = self.members.quorum_position();
                let advanced = self.commit_position_counter.advance(quorum_position as i64);
                let heartbeat_elapsed =
                    self.cached_now_ms - self.time_of_last_log_update_ms >= self.config.heartbeat_interval().as_millis() as i64;
                if advanced || heartbeat_elapsed {
                    self.broadcast_commit_position();
                    self.time_of_last_log_update_ms = self.cached_now_ms;
                }
            }
            Role::Follower => {
                let recording_position = self.collaborators.log.position();
                if self
                    .recording_position_counter
                    .advance(recording_position as i64)
                {
                    let msg = AppendedPositionMessage {
                        term_position: recording_position,
                        term_id: self.leadership_term_id,
                        follower_id: self.config.member_id(),
                    };
                    if let Some(leader_id) = self.leader_member_id {
                        self.collaborators.member_status_publisher.send_appended_position(leader_id, msg);
                    }
                }
                let timeout_ms = self.config.heartbeat_timeout().as_millis() as i64;
                if self.is_recovered && self.cached_now_ms - self.time_of_last_log_update_ms > timeout_ms {
                    error!("no heartbeat from leader within heartbeat_timeout_ms; terminating");
                    self.terminate(TerminationReason::Fatal);
                }
            }
            Role::Candidate => {}
        }
    }

    fn broadcast_commit_position(&mut self) {
        let msg = CommitPositionMessage {
            term_position: self.commit_position_counter.get() as u64,
            term_id: self.leadership_term_id,
            leader_id: self.config.member_id(),
            log_session_id: self.log_session_id.unwrap_or(NULL_LOG_SESSION_ID),
        };
        self.collaborators.member_status_publisher.broadcast_commit_position(msg);
    }

    // ---------------------------------------------------------------
    // §4.2 member-status dispatch (election + steady state)
    // ---------------------------------------------------------------

    fn handle_member_status_message(&mut self, msg: MemberStatusMessage) {
        match msg {
            MemberStatusMessage::RequestVote(rv) => self.handle_request_vote(rv),
            MemberStatusMessage::Vote(v) => {
                if self.role != Role::Leader && self.leader_member_id.is_none() {
                    self.leader_member_id = Some(v.candidate_id);
                }
            }
            MemberStatusMessage::AppendedPosition(ap) => {
                if self.role == Role::Leader {
                    if let Some(m) = self.members.get_mut(ap.follower_id) {
                        m.set_term_position(ap.term_position);
                    }
                }
            }
            MemberStatusMessage::CommitPosition(cp) => {
                if self.role != Role::Leader {
                    self.leader_member_id = Some(cp.leader_id);
                    self.log_session_id = Some(cp.log_session_id);
                    self.follower_commit_position = Some(cp.term_position);
                    self.time_of_last_log_update_ms = self.cached_now_ms;
                }
            }
        }
    }

    fn handle_request_vote(&mut self, rv: RequestVoteMessage) {
        let granted = rv.term_id == self.leadership_term_id
            && rv.last_base_log_position == self.recovery_plan.last_log_position()
            && rv.last_term_position >= self.recovery_plan.last_term_position_appended();
        if granted {
            self.voted_for_member_id = Some(rv.candidate_id);
        }
        let reply = VoteMessage {
            term_id: rv.term_id,
            last_base_log_position: rv.last_base_log_position,
            last_term_position: rv.last_term_position,
            candidate_id: rv.candidate_id,
            follower_id: self.config.member_id(),
            vote_granted: granted,
        };
        self.collaborators.member_status_publisher.send_vote(rv.candidate_id, reply);
    }

    // ---------------------------------------------------------------
    // §4.3 Client session pipeline
    // ---------------------------------------------------------------

    fn on_session_connect(
        &mut self,
        correlation_id: i64,
        response_stream_id: i32,
        response_channel: String,
        credentials: &[u8],
    ) {
        let session_id = self.sessions.allocate_session_id();
        let mut session = ClusterSession::new(session_id, response_stream_id, response_channel, self.cached_now_ms);
        session.set_last_correlation_id(correlation_id);

        let handle = self
            .collaborators
            .transport
            .add_publication(session.response_channel(), response_stream_id);
        session.set_response_publication(handle);
        session.set_response_connected(self.collaborators.transport.is_publication_connected(handle));

        if self.sessions.total_sessions() < self.config.max_concurrent_sessions() {
            self.collaborators
                .authenticator
                .on_connect_request(session_id, credentials, self.cached_now_ms);
            self.sessions.push_pending(session);
        } else {
            session.set_state(SessionState::Rejected(RejectReason::SessionLimit));
            self.sessions.push_rejected(session);
        }
    }

    fn on_challenge_response(&mut self, correlation_id: i64, session_id: u64, credentials: &[u8]) {
        let now_ms = self.cached_now_ms;
        let authenticator = &mut self.collaborators.authenticator;
        if let Some(session) = self.sessions.find_pending_mut(session_id) {
            if *session.state() == SessionState::Challenged {
                session.touch(now_ms);
                session.set_last_correlation_id(correlation_id);
                authenticator.on_challenge_response(session_id, credentials, session, now_ms);
            }
        }
    }

    fn on_session_message(&mut self, session_id: u64, correlation_id: i64, payload: Vec<u8>) -> IngressAction {
        let open_term_position = match self.sessions.get_open_mut(session_id) {
            None => return IngressAction::Continue,
            Some(session) => match *session.state() {
                SessionState::TimedOut | SessionState::Closed => return IngressAction::Continue,
                SessionState::Open { open_term_position } => open_term_position,
                _ => return IngressAction::Continue,
            },
        };
        let _ = open_term_position;

        let record = LogRecord::SessionMessage(SessionMessageRecord {
            leadership_term_id: self.leadership_term_id,
            log_position: self.base_log_position + self.collaborators.log.position(),
            session_id: session_id,
            timestamp: self.cached_now_ms,
            payload: payload,
        });
        match self.collaborators.log.append(&record) {
            AppendResult::Position(_) => {
                if let Some(session) = self.sessions.get_open_mut(session_id) {
                    session.touch(self.cached_now_ms);
                    session.set_last_correlation_id(correlation_id);
                }
                IngressAction::Continue
            }
            AppendResult::BackPressure => IngressAction::Abort,
        }
    }

    fn on_keep_alive(&mut self, session_id: u64) {
        if let Some(session) = self.sessions.get_open_mut(session_id) {
            session.touch(self.cached_now_ms);
        }
    }

    fn on_session_close(&mut self, session_id: u64) {
        let record = LogRecord::SessionClose(SessionCloseRecord {
            leadership_term_id: self.leadership_term_id,
            log_position: self.base_log_position + self.collaborators.log.position(),
            session_id: session_id,
            timestamp: self.cached_now_ms,
            reason: CloseReason::UserAction,
        });
        if let AppendResult::Position(_) = self.collaborators.log.append(&record) {
            self.sessions.remove_open(session_id);
        }
    }

    fn on_admin_query(&mut self, session_id: u64, correlation_id: i64, kind: AdminQueryKind) {
        match kind {
            AdminQueryKind::Endpoints => {
                let detail = format!(
                    "id={},memberStatus={},log={},archive={}",
                    self.config.member_id(),
                    self.config.member_id(),
                    "log",
                    "archive"
                );
                let sent = self.collaborators.egress.send_admin_response(session_id, correlation_id, &detail);
                if !sent {
                    if let Some(session) = self.sessions.get_open_mut(session_id) {
                        session.stash_admin_response(detail);
                    }
                }
            }
            // RECORDING_LOG admin query is unimplemented (§9 open question 3):
            // reply with ERROR until it is defined.
            AdminQueryKind::RecordingLog => {
                self.collaborators
                    .egress
                    .send_error(session_id, correlation_id, EgressErrorCode::AuthenticationRejected);
            }
        }
    }

    fn pump_pending_sessions(&mut self) -> i32 {
        enum Outcome {
            Open,
            Reject(RejectReason),
            TimedOut,
            Retry,
        }

        let mut work = 0;
        let mut index = 0;
        while index < self.sessions.pending_len() {
            let now_ms = self.cached_now_ms;
            let timeout_ms = self.config.session_timeout().as_millis() as i64;

            let outcome = {
                let authenticator = &mut self.collaborators.authenticator;
                let transport = &self.collaborators.transport;
                let session = &mut self.sessions.pending_mut_slice()[index];

                if !session.is_response_connected() {
                    if let Some(handle) = session.response_publication() {
                        if transport.is_publication_connected(handle) {
                            session.set_response_connected(true);
                        }
                    }
                }

                match session.state().clone() {
                    SessionState::Init | SessionState::Connected if session.is_response_connected() => {
                        session.set_state(SessionState::Connected);
                        authenticator.on_process_connected_session(session, now_ms);
                        work += 1;
                    }
                    SessionState::Challenged if session.is_response_connected() => {
                        authenticator.on_process_challenged_session(session, now_ms);
                        work += 1;
                    }
                    _ => {}
                }

                match session.state().clone() {
                    SessionState::Authenticated => Outcome::Open,
                    SessionState::Rejected(reason) => Outcome::Reject(reason),
                    _ if session.is_timed_out_since(now_ms, timeout_ms) => Outcome::TimedOut,
                    _ => Outcome::Retry,
                }
            };

            match outcome {
                Outcome::Open => {
                    let mut session = self.sessions.take_pending(index);
                    let record = LogRecord::SessionOpen(SessionOpenRecord {
                        leadership_term_id: self.leadership_term_id,
                        log_position: self.base_log_position + self.collaborators.log.position(),
                        session_id: session.id(),
                        timestamp: self.cached_now_ms,
                        response_stream_id: session.response_stream_id(),
                        response_channel: session.response_channel().to_string(),
                    });
                    if let AppendResult::Position(position) = self.collaborators.log.append(&record) {
                        session.set_state(SessionState::Open {
                            open_term_position: position,
                        });
                        self.sessions.insert_open(session);
                    } else {
                        // back-pressure: put it back for retry next tick.
                        self.sessions.push_pending(session);
                        index += 1;
                    }
                }
                Outcome::Reject(reason) => {
                    let mut session = self.sessions.take_pending(index);
                    session.set_state(SessionState::Rejected(reason));
                    self.sessions.push_rejected(session);
                }
                Outcome::TimedOut => {
                    self.sessions.take_pending(index);
                }
                Outcome::Retry => {
                    index += 1;
                }
            }
        }
        work
    }

    fn pump_rejected_sessions(&mut self) -> i32 {
        let mut work = 0;
        let now_ms = self.cached_now_ms;
        let timeout_ms = self.config.session_timeout().as_millis() as i64;
        let mut index = 0;
        while index < self.sessions.rejected_len() {
            let done;
            {
                let session = &self.sessions.rejected()[index];
                let code = match *session.state() {
                    SessionState::Rejected(RejectReason::SessionLimit) => Some(EgressErrorCode::SessionLimit),
                    SessionState::Rejected(RejectReason::AuthenticationRejected) => {
                        Some(EgressErrorCode::AuthenticationRejected)
                    }
                    _ => None,
                };
                let sent = if let Some(code) = code {
                    self.collaborators
                        .egress
                        .send_error(session.id(), session.last_correlation_id(), code)
                } else {
                    false
                };
                done = sent || session.is_timed_out_since(now_ms, timeout_ms);
                if sent {
                    work += 1;
                }
            }
            if done {
                self.sessions.take_rejected(index);
            } else {
                index += 1;
            }
        }
        work
    }

    fn session_housekeeping(&mut self) {
        let now_ms = self.cached_now_ms;
        let timeout_ms = self.config.session_timeout().as_millis() as i64;
        let leadership_term_id = self.leadership_term_id;
        let base_log_position = self.base_log_position;
        let log_position_now = self.collaborators.log.position();

        let mut to_remove = Vec::new();
        let mut pending_admin = Vec::new();

        for (&id, session) in self.sessions.open_sessions_mut().iter_mut() {
            match session.state().clone() {
                SessionState::Open { .. } => {
                    if session.is_timed_out_since(now_ms, timeout_ms) {
                        pending_admin.push((id, CloseReason::Timeout, false));
                    } else if let Some(detail) = session.pending_admin_response().map(|s| s.to_string()) {
                        pending_admin.push((id, CloseReason::Timeout, true));
                        let _ = detail;
                    }
                }
                SessionState::TimedOut | SessionState::Closed => {
                    pending_admin.push((id, CloseReason::Timeout, false));
                }
                SessionState::Connected => {
                    // retry append-connected is handled by the pending pump;
                    // an open-session in CONNECTED state only arises from a
                    // race during authentication and is otherwise a no-op
                    // here.
                }
                _ => {}
            }
        }

        for (id, _reason, is_admin_retry) in pending_admin {
            if is_admin_retry {
                let detail = self
                    .sessions
                    .get_open_mut(id)
                    .and_then(|s| s.pending_admin_response().map(|d| d.to_string()));
                if let Some(detail) = detail {
                    let correlation_id = self.sessions.get_open_mut(id).map(|s| s.last_correlation_id());
                    if let Some(correlation_id) = correlation_id {
                        if self.collaborators.egress.send_admin_response(id, correlation_id, &detail) {
                            if let Some(session) = self.sessions.get_open_mut(id) {
                                session.clear_admin_response();
                            }
                        }
                    }
                }
                continue;
            }

            let record = LogRecord::SessionClose(SessionCloseRecord {
                leadership_term_id: leadership_term_id,
                log_position: base_log_position + log_position_now,
                session_id: id,
                timestamp: now_ms,
                reason: CloseReason::Timeout,
            });
            match self.collaborators.log.append(&record) {
                AppendResult::Position(_) => {
                    to_remove.push(id);
                }
                AppendResult::BackPressure => {
                    if let Some(session) = self.sessions.get_open_mut(id) {
                        session.set_state(SessionState::TimedOut);
                    }
                }
            }
        }

        for id in to_remove {
            self.sessions.remove_open(id);
        }
    }

    // ---------------------------------------------------------------
    // §4.5 Cluster actions (toggle & ack)
    // ---------------------------------------------------------------

    fn process_control_toggle(&mut self) {
        if self.control_toggle == ControlToggle::Neutral {
            return;
        }
        if !self.consensus_state.is_valid_action(self.control_toggle) {
            return; // toggle stays pending until the state allows it (§8 boundary).
        }
        let record = LogRecord::ClusterAction(ClusterActionRecord {
            leadership_term_id: self.leadership_term_id,
            log_position: self.base_log_position + self.collaborators.log.position(),
            action: self.control_toggle,
            timestamp: self.cached_now_ms,
        });
        if let AppendResult::Position(_) = self.collaborators.log.append(&record) {
            self.apply_control_toggle_locally(self.control_toggle);
        }
    }

    fn apply_control_toggle_locally(&mut self, action: ControlToggle) {
        self.service_acks.reset();
        match action {
            ControlToggle::Suspend => self.set_consensus_state(ConsensusState::Suspended),
            ControlToggle::Resume => {
                self.set_consensus_state(ConsensusState::Active);
                self.control_toggle = ControlToggle::Neutral;
            }
            ControlToggle::Snapshot => self.set_consensus_state(ConsensusState::Snapshot),
            ControlToggle::Shutdown => self.set_consensus_state(ConsensusState::Shutdown),
            ControlToggle::Abort => self.set_consensus_state(ConsensusState::Abort),
            ControlToggle::Neutral => {}
        }
    }

    /// External command entry point for the control-toggle counter (§6).
    pub fn request_control_action(&mut self, action: ControlToggle) {
        self.control_toggle = action;
    }

    fn process_service_ack(&mut self, ack: ServiceAck) {
        if self.service_acks.record().is_err() {
            error!("service ack count exceeded configured service count; terminating");
            self.terminate(TerminationReason::Fatal);
            return;
        }

        let expected_log_position = self.base_log_position + self.collaborators.log.position();
        if ack.log_position != expected_log_position || ack.leadership_term_id != self.leadership_term_id {
            // Only cluster-action acks are required to match exactly; plain
            // log-position acks are allowed to lag and simply advance the
            // ack count without this check.
            if ack.action.is_some() {
                error!("service ack log position mismatch; terminating");
                self.terminate(TerminationReason::Fatal);
                return;
            }
        }

        if !self.service_acks.is_complete() {
            return;
        }

        match self.consensus_state {
            ConsensusState::Snapshot => {
                self.snapshot_count += 1;
                self.set_consensus_state(ConsensusState::Active);
                self.control_toggle = ControlToggle::Neutral;
                let now_ms = self.cached_now_ms;
                for session in self.sessions.open_sessions_mut().values_mut() {
                    session.touch(now_ms);
                }
            }
            ConsensusState::Shutdown => {
                self.collaborators
                    .recording_log
                    .commit_leadership_term_position(self.leadership_term_id, self.base_log_position + self.collaborators.log.position());
                self.set_consensus_state(ConsensusState::Closed);
                self.terminate(TerminationReason::Shutdown);
            }
            ConsensusState::Abort => {
                self.collaborators
                    .recording_log
                    .commit_leadership_term_position(self.leadership_term_id, self.base_log_position + self.collaborators.log.position());
                self.set_consensus_state(ConsensusState::Closed);
                self.terminate(TerminationReason::Abort);
            }
            _ => {}
        }
    }

    fn terminate(&mut self, reason: TerminationReason) {
        self.set_consensus_state(ConsensusState::Closed);
        self.collaborators.termination_hook.on_terminate(reason);
    }

    // ---------------------------------------------------------------
    // §4.6 Timers
    // ---------------------------------------------------------------

    pub fn schedule_timer(&mut self, correlation_id: u64, deadline_ms: i64) {
        self.timers.schedule(correlation_id, deadline_ms);
    }

    pub fn cancel_timer(&mut self, correlation_id: u64) -> bool {
        self.timers.cancel(correlation_id)
    }

    fn poll_timers(&mut self) -> i32 {
        let due = self.timers.expired(self.cached_now_ms);
        let mut fired = 0;
        for (correlation_id, _deadline) in due {
            let record = LogRecord::TimerEvent(TimerEventRecord {
                leadership_term_id: self.leadership_term_id,
                log_position: self.base_log_position + self.collaborators.log.position(),
                correlation_id: correlation_id,
                timestamp: self.cached_now_ms,
            });
            if let AppendResult::Position(_) = self.collaborators.log.append(&record) {
                self.timers.cancel(correlation_id);
                fired += 1;
            }
            // on back-pressure the timer stays scheduled for retry next tick.
        }
        fired
    }

    // ---------------------------------------------------------------
    // §4.7 Recovery
    // ---------------------------------------------------------------

    fn recover_from_snapshot(&mut self, step: SnapshotStep) -> Result<()> {
        self.leadership_term_id = step.leadership_term_id;
        self.base_log_position = step.log_position;

        if self.collaborators.archive.list_recording(step.recording_id).is_none() {
            return Err(SequencerError::Fatal(FatalReason::RecordingIdNotFound {
                recording_id: step.recording_id,
            }));
        }

        let replay_session_id = self.collaborators.archive.start_replay(step.recording_id, 0, None);
        if replay_session_id != 0 {
            // A snapshot is always the first replay in the recovery
            // sequence (§4.7), so its replay session id is always 0.
            return Err(SequencerError::Fatal(FatalReason::ReplaySessionIdMismatch {
                expected: 0,
                got: replay_session_id as u64,
            }));
        }

        let join = JoinLog {
            leadership_term_id: self.leadership_term_id,
            commit_position_counter_id: 0,
            session_id: replay_session_id,
            stream_id: LOG_STREAM_ID,
            channel: "log".to_string(),
        };
        while !self.collaborators.service_control_publisher.publish_join_log(&join) {
            self.idle_tick();
        }
        self.await_service_acks()?;

        let mut source: Box<dyn SnapshotSource> = ::std::mem::replace(&mut self.collaborators.snapshot_log, Box::new(NullSnapshotSource));
        let ok = ::snapshot::read_snapshot(&mut *source, self);
        self.collaborators.snapshot_log = source;
        if !ok {
            return Err(SequencerError::Fatal(FatalReason::RecoveryImageClosedMidStream));
        }
        self.await_service_acks()?;

        Ok(())
    }

    fn recover_term(&mut self, index: u64, step: TermStep) -> Result<()> {
        if step.log_position != self.base_log_position {
            return Err(SequencerError::Fatal(FatalReason::ReplayBasePositionMismatch {
                expected: self.base_log_position,
                got: step.log_position,
            }));
        }
        self.leadership_term_id = step.leadership_term_id;

        let replay_session_id = self.collaborators.archive.start_replay(
            step.recording_id,
            step.start_position,
            step.stop_position.map(|stop| stop - step.start_position),
        );
        if replay_session_id as u64 != index {
            return Err(SequencerError::Fatal(FatalReason::ReplaySessionIdMismatch {
                expected: index,
                got: replay_session_id as u64,
            }));
        }

        let join = JoinLog {
            leadership_term_id: self.leadership_term_id,
            commit_position_counter_id: 0,
            session_id: replay_session_id,
            stream_id: LOG_STREAM_ID,
            channel: "log".to_string(),
        };
        while !self.collaborators.service_control_publisher.publish_join_log(&join) {
            self.idle_tick();
        }
        self.await_service_acks()?;

        let stop_position = step.stop_position.unwrap_or(u64::max_value());
        let mut log: Box<dyn Log> = ::std::mem::replace(&mut self.collaborators.log, Box::new(NullLog));
        let ok = recovery::replay_term(&mut *log, stop_position, self);
        self.collaborators.log = log;
        if !ok {
            return Err(SequencerError::Fatal(FatalReason::RecoveryImageClosedMidStream));
        }
        self.await_service_acks()?;

        let advanced_position = step.stop_position.unwrap_or(self.collaborators.log.position());
        self.collaborators
            .recording_log
            .commit_leadership_term_position(self.leadership_term_id, advanced_position);
        self.base_log_position += advanced_position.saturating_sub(step.start_position);

        recovery::drain_failed_cancellations(&mut self.timers, &mut self.failed_timer_cancellations);
        Ok(())
    }

    // ---------------------------------------------------------------
    // §4.8 Snapshot
    // ---------------------------------------------------------------

    /// Drives a snapshot write through `sink` for the current in-memory
    /// state. Called once the control toggle has transitioned the agent
    /// into `ConsensusState::Snapshot`.
    pub fn write_snapshot(&mut self, sink: &mut dyn SnapshotSink) -> bool {
        let open_sessions: Vec<ClusterSession> = self.sessions.open_sessions().values().cloned().collect();
        ::snapshot::write_snapshot(
            sink,
            self.leadership_term_id,
            self.base_log_position + self.collaborators.log.position(),
            self.recovery_plan.terms.len() as u32,
            &open_sessions,
            &self.timers,
            self.sessions.next_session_id(),
        )
    }
}

impl ReplayHandlers for SequencerAgent {
    fn on_replay_session_open(&mut self, record: &SessionOpenRecord) {
        self.cached_now_ms = record.timestamp;
        self.sessions.observe_session_id(record.session_id);
        let mut session = ClusterSession::new(
            record.session_id,
            record.response_stream_id,
            record.response_channel.clone(),
            record.timestamp,
        );
        session.set_state(SessionState::Open {
            open_term_position: record.log_position,
        });
        self.sessions.insert_open(session);
    }

    fn on_replay_session_message(&mut self, record: &SessionMessageRecord) {
        self.cached_now_ms = record.timestamp;
        self.sessions.observe_session_id(record.session_id);
        if let Some(session) = self.sessions.get_open_mut(record.session_id) {
            session.touch(record.timestamp);
        }
    }

    fn on_replay_session_close(&mut self, record: &SessionCloseRecord) {
        self.cached_now_ms = record.timestamp;
        self.sessions.observe_session_id(record.session_id);
        self.sessions.remove_open(record.session_id);
    }

    fn on_replay_timer_event(&mut self, record: &TimerEventRecord) {
        self.cached_now_ms = record.timestamp;
        recovery::try_cancel_or_queue(&mut self.timers, &mut self.failed_timer_cancellations, record.correlation_id);
    }

    fn on_replay_cluster_action(&mut self, record: &ClusterActionRecord) {
        self.cached_now_ms = record.timestamp;
        self.apply_control_toggle_locally(record.action);
    }

    fn on_reload_state(&mut self, next_session_id: u64) {
        self.sessions.set_next_session_id(next_session_id);
    }

    fn on_reload_timer(&mut self, correlation_id: u64, deadline_ms: i64) {
        self.timers.schedule(correlation_id, deadline_ms);
    }
}
