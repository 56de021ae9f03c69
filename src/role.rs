//! Role/state cross-product (§9 design note): `Role` and `ConsensusState` are
//! deliberately two orthogonal tagged variants rather than one combined
//! enum, the way the teacher keeps `State` (candidate/leader/follower)
//! separate from the term/commit-index fields it transitions alongside in
//! `ServerState`.

/// Mirrors the teacher's `State` enum (`CANDIDATE`/`LEADER`/`FOLLOWER`),
/// renamed to the spec's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Follower,
    Candidate,
    Leader,
}

impl Role {
    /// Stable numeric encoding for `StateCounter` (§9 "Shared counters").
    pub fn code(&self) -> i64 {
        match *self {
            Role::Follower => 0,
            Role::Candidate => 1,
            Role::Leader => 2,
        }
    }
}

/// The consensus_state of §3's "Sequencer state".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusState {
    Init,
    Active,
    Suspended,
    Snapshot,
    Shutdown,
    Abort,
    Closed,
}

impl ConsensusState {
    /// Stable numeric encoding for `StateCounter` (§9 "Shared counters").
    pub fn code(&self) -> i64 {
        match *self {
            ConsensusState::Init => 0,
            ConsensusState::Active => 1,
            ConsensusState::Suspended => 2,
            ConsensusState::Snapshot => 3,
            ConsensusState::Shutdown => 4,
            ConsensusState::Abort => 5,
            ConsensusState::Closed => 6,
        }
    }
}

/// The control-toggle values of §6, plus `Neutral` for "no command pending".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlToggle {
    Neutral,
    Suspend,
    Resume,
    Snapshot,
    Shutdown,
    Abort,
}

impl ConsensusState {
    /// Guards which consensus states a given control-toggle action may be
    /// applied from (§4.5's `state.is_valid(action)`). Only ACTIVE accepts a
    /// fresh action being appended; SUSPENDED only accepts RESUME.
    pub fn is_valid_action(&self, action: ControlToggle) -> bool {
        match (*self, action) {
            (ConsensusState::Active, ControlToggle::Suspend) => true,
            (ConsensusState::Active, ControlToggle::Snapshot) => true,
            (ConsensusState::Active, ControlToggle::Shutdown) => true,
            (ConsensusState::Active, ControlToggle::Abort) => true,
            (ConsensusState::Suspended, ControlToggle::Resume) => true,
            (ConsensusState::Suspended, ControlToggle::Shutdown) => true,
            (ConsensusState::Suspended, ControlToggle::Abort) => true,
            _ => false,
        }
    }
}

/// Guard table for role transitions (§4.2). `Follower -> Candidate` is only
/// legal for the appointed leader at startup; `Follower -> Leader` directly
/// is only legal when the cluster has a single member. Every other edge in
/// the table is rejected.
pub fn role_transition_allowed(from: Role, to: Role, is_appointed_leader: bool, cluster_size: usize) -> bool {
    match (from, to) {
        (Role::Follower, Role::Candidate) => is_appointed_leader,
        (Role::Follower, Role::Leader) => cluster_size == 1,
        (Role::Candidate, Role::Leader) => true,
        _ => false,
    }
}
