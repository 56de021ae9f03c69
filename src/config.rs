use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Endpoints advertised by one cluster member, grounded on the original
/// `Config`'s `cluster: HashMap<u64, SocketAddr>` but split into the three
/// channels the data model (§3) requires per member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberEndpoints {
    pub client_facing: SocketAddr,
    pub member_facing: SocketAddr,
    pub log: SocketAddr,
}

/// Static cluster membership and the tunables referenced throughout §5
/// (`session_timeout_ms`, `heartbeat_interval_ms`, `heartbeat_timeout_ms`).
///
/// Parsing this from a CLI flag or a config file is explicitly out of scope
/// (§1); construction is always programmatic, as the teacher's own
/// `Config::new` does. The commented-out `from_file` stub below is kept for
/// the same reason the teacher kept it: a placeholder for bootstrap code
/// that lives outside this crate.
#[derive(Clone, Debug)]
pub struct SequencerConfig {
    members: HashMap<u64, MemberEndpoints>,
    appointed_leader_id: u64,
    member_id: u64,
    max_concurrent_sessions: usize,
    session_timeout: Duration,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
}

impl SequencerConfig {
    pub fn new(
        members: HashMap<u64, MemberEndpoints>,
        appointed_leader_id: u64,
        member_id: u64,
        max_concurrent_sessions: usize,
        session_timeout: Duration,
        heartbeat_interval: Duration,
        heartbeat_timeout: Duration,
    ) -> SequencerConfig {
        SequencerConfig {
            members: members,
            appointed_leader_id: appointed_leader_id,
            member_id: member_id,
            max_concurrent_sessions: max_concurrent_sessions,
            session_timeout: session_timeout,
            heartbeat_interval: heartbeat_interval,
            heartbeat_timeout: heartbeat_timeout,
        }
    }

    pub fn members(&self) -> &HashMap<u64, MemberEndpoints> {
        &self.members
    }

    pub fn cluster_size(&self) -> usize {
        self.members.len()
    }

    pub fn appointed_leader_id(&self) -> u64 {
        self.appointed_leader_id
    }

    pub fn member_id(&self) -> u64 {
        self.member_id
    }

    pub fn max_concurrent_sessions(&self) -> usize {
        self.max_concurrent_sessions
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_timeout
    }

    pub fn quorum_size(&self) -> usize {
        self.members.len() / 2 + 1
    }

    // TODO: eventually implement
    // pub fn from_file(file: String) -> SequencerConfig { }
}
