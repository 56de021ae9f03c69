//! Client session lifecycle (§3 `ClusterSession`, §4.3).
//!
//! Session FSM design note (§9): the state is a tagged union whose variants
//! carry only the data each state needs, mirroring how the teacher keeps
//! `PeerState::NonVoting` carrying its own round/timer/pipe fields instead of
//! bolting them onto a flat struct. Pending/rejected sessions live in `Vec`s
//! removed from with swap-remove (order doesn't matter there); the open
//! session map is a `HashMap` with explicit iterator-driven removal.

use std::collections::HashMap;

/// Why a session was closed, carried into the `SessionClose` log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    UserAction,
    Timeout,
    ServiceAction,
    AuthenticationRejected,
}

/// Reject causes emitted by the rejected-session pump (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    SessionLimit,
    AuthenticationRejected,
}

pub type ResponseStreamId = i32;
pub type ResponseChannel = String;
pub type ResponsePublicationHandle = u64;

/// Tagged session state. Transitions are monotonic except the
/// CONNECTED<->CHALLENGED ping-pong during authentication (§3 invariant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Connected,
    Challenged,
    Authenticated,
    Rejected(RejectReason),
    /// Carries the log position the session-open record landed at.
    Open { open_term_position: u64 },
    TimedOut,
    Closed,
}

/// One client session (§3). `last_correlation_id` lets a late admin-query
/// reply be matched back to the request that asked for it.
#[derive(Debug, Clone)]
pub struct ClusterSession {
    id: u64,
    response_stream_id: ResponseStreamId,
    response_channel: ResponseChannel,
    state: SessionState,
    response_connected: bool,
    response_publication: Option<ResponsePublicationHandle>,
    time_of_last_activity: i64,
    last_correlation_id: i64,
    pending_admin_response: Option<String>,
}

impl ClusterSession {
    pub fn new(
        id: u64,
        response_stream_id: ResponseStreamId,
        response_channel: ResponseChannel,
        now_ms: i64,
    ) -> ClusterSession {
        ClusterSession {
            id: id,
            response_stream_id: response_stream_id,
            response_channel: response_channel,
            state: SessionState::Init,
            response_connected: false,
            response_publication: None,
            time_of_last_activity: now_ms,
            last_correlation_id: -1,
            pending_admin_response: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    pub fn response_stream_id(&self) -> ResponseStreamId {
        self.response_stream_id
    }

    pub fn response_channel(&self) -> &str {
        &self.response_channel
    }

    pub fn is_response_connected(&self) -> bool {
        self.response_connected
    }

    pub fn set_response_connected(&mut self, connected: bool) {
        self.response_connected = connected;
    }

    pub fn response_publication(&self) -> Option<ResponsePublicationHandle> {
        self.response_publication
    }

    pub fn set_response_publication(&mut self, handle: ResponsePublicationHandle) {
        self.response_publication = Some(handle);
    }

    pub fn time_of_last_activity(&self) -> i64 {
        self.time_of_last_activity
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.time_of_last_activity = now_ms;
    }

    pub fn last_correlation_id(&self) -> i64 {
        self.last_correlation_id
    }

    pub fn set_last_correlation_id(&mut self, correlation_id: i64) {
        self.last_correlation_id = correlation_id;
    }

    pub fn stash_admin_response(&mut self, detail: String) {
        self.pending_admin_response = Some(detail);
    }

    pub fn pending_admin_response(&self) -> Option<&str> {
        self.pending_admin_response.as_ref().map(|s| s.as_str())
    }

    pub fn clear_admin_response(&mut self) {
        self.pending_admin_response = None;
    }

    pub fn is_timed_out_since(&self, now_ms: i64, timeout_ms: i64) -> bool {
        now_ms - self.time_of_last_activity > timeout_ms
    }

    pub fn is_open(&self) -> bool {
        match self.state {
            SessionState::Open { .. } => true,
            _ => false,
        }
    }
}

/// Capability handed to the authenticator while processing a pending session
/// (§6 "session-proxy capability set {authenticate, challenge, reject}").
/// The authenticator can only move the session through these three
/// transitions; it cannot reach into the session map or the log directly.
pub trait SessionProxy {
    fn authenticate(&mut self);
    fn challenge(&mut self);
    fn reject(&mut self, reason: RejectReason);
}

impl SessionProxy for ClusterSession {
    fn authenticate(&mut self) {
        self.state = SessionState::Authenticated;
    }

    fn challenge(&mut self) {
        self.state = SessionState::Challenged;
    }

    fn reject(&mut self, reason: RejectReason) {
        self.state = SessionState::Rejected(reason);
    }
}

/// Owns the three disjoint session collections (§3 invariant: at most one
/// entry in pending ∪ rejected ∪ sessionMap for any session) plus the
/// monotonic id allocator.
#[derive(Default)]
pub struct SessionTable {
    pending: Vec<ClusterSession>,
    rejected: Vec<ClusterSession>,
    open: HashMap<u64, ClusterSession>,
    next_session_id: u64,
}

impl SessionTable {
    pub fn new() -> SessionTable {
        SessionTable {
            pending: Vec::new(),
            rejected: Vec::new(),
            open: HashMap::new(),
            next_session_id: 0,
        }
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session_id
    }

    /// Enforces `next_session_id` strict monotonicity even across recovery
    /// (§8 invariant) by never moving it backwards.
    pub fn observe_session_id(&mut self, seen_id: u64) {
        if seen_id >= self.next_session_id {
            self.next_session_id = seen_id + 1;
        }
    }

    /// Restores `next_session_id` from a snapshot or reload record, which
    /// carries the allocator value directly rather than a "seen" session id
    /// (so it is not off-by-one the way `observe_session_id` is).
    pub fn set_next_session_id(&mut self, next_session_id: u64) {
        if next_session_id >= self.next_session_id {
            self.next_session_id = next_session_id;
        }
    }

    pub fn allocate_session_id(&mut self) -> u64 {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }

    pub fn total_sessions(&self) -> usize {
        self.pending.len() + self.open.len()
    }

    pub fn push_pending(&mut self, session: ClusterSession) {
        self.pending.push(session);
    }

    pub fn push_rejected(&mut self, session: ClusterSession) {
        self.rejected.push(session);
    }

    pub fn pending(&self) -> &[ClusterSession] {
        &self.pending
    }

    pub fn pending_mut_slice(&mut self) -> &mut [ClusterSession] {
        &mut self.pending
    }

    pub fn rejected(&self) -> &[ClusterSession] {
        &self.rejected
    }

    pub fn open_sessions(&self) -> &HashMap<u64, ClusterSession> {
        &self.open
    }

    pub fn open_sessions_mut(&mut self) -> &mut HashMap<u64, ClusterSession> {
        &mut self.open
    }

    pub fn get_open_mut(&mut self, id: u64) -> Option<&mut ClusterSession> {
        self.open.get_mut(&id)
    }

    pub fn remove_open(&mut self, id: u64) -> Option<ClusterSession> {
        self.open.remove(&id)
    }

    pub fn insert_open(&mut self, session: ClusterSession) {
        self.open.insert(session.id(), session);
    }

    pub fn find_pending_mut(&mut self, id: u64) -> Option<&mut ClusterSession> {
        self.pending.iter_mut().find(|s| s.id() == id)
    }

    /// Removes a pending session by index with swap-remove (order doesn't
    /// matter for pending/rejected lists per §9).
    pub fn take_pending(&mut self, index: usize) -> ClusterSession {
        self.pending.swap_remove(index)
    }

    pub fn take_rejected(&mut self, index: usize) -> ClusterSession {
        self.rejected.swap_remove(index)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn rejected_len(&self) -> usize {
        self.rejected.len()
    }
}
