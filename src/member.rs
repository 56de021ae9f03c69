use std::collections::HashMap;

use config::MemberEndpoints;

/// Placeholder for the type of the outgoing control publication handle this
/// member is addressed through. The transport collaborator (§6) owns the
/// real connection; the sequencer just remembers which one to use.
pub type ControlPublicationHandle = u64;

/// One row of the static membership table (§3 `ClusterMember`).
///
/// `term_position`/`voted_for_id` are the leader's view of what that peer
/// has reported; they are written by the member-status adapter (§4.4) and
/// read by commit-position advancement.
#[derive(Clone, Debug)]
pub struct ClusterMember {
    id: u64,
    endpoints: MemberEndpoints,
    term_position: u64,
    voted_for_id: Option<u64>,
    publication: Option<ControlPublicationHandle>,
    is_leader: bool,
}

impl ClusterMember {
    pub fn new(id: u64, endpoints: MemberEndpoints) -> ClusterMember {
        ClusterMember {
            id: id,
            endpoints: endpoints,
            term_position: 0,
            voted_for_id: None,
            publication: None,
            is_leader: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn endpoints(&self) -> &MemberEndpoints {
        &self.endpoints
    }

    pub fn term_position(&self) -> u64 {
        self.term_position
    }

    pub fn set_term_position(&mut self, position: u64) {
        self.term_position = position;
    }

    pub fn voted_for_id(&self) -> Option<u64> {
        self.voted_for_id
    }

    pub fn set_voted_for_id(&mut self, id: Option<u64>) {
        self.voted_for_id = id;
    }

    pub fn publication(&self) -> Option<ControlPublicationHandle> {
        self.publication
    }

    pub fn connect_publication(&mut self, handle: ControlPublicationHandle) {
        self.publication = Some(handle);
    }

    pub fn is_connected(&self) -> bool {
        self.publication.is_some()
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    pub fn set_is_leader(&mut self, is_leader: bool) {
        self.is_leader = is_leader;
    }
}

/// The static membership table, keyed by the stable numeric member id.
/// Shared across election, commit-position advancement, and the
/// member-status adapter.
#[derive(Clone, Debug, Default)]
pub struct ClusterMemberTable {
    members: HashMap<u64, ClusterMember>,
}

impl ClusterMemberTable {
    pub fn new() -> ClusterMemberTable {
        ClusterMemberTable {
            members: HashMap::new(),
        }
    }

    pub fn insert(&mut self, member: ClusterMember) {
        self.members.insert(member.id(), member);
    }

    pub fn get(&self, id: u64) -> Option<&ClusterMember> {
        self.members.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut ClusterMember> {
        self.members.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> ::std::collections::hash_map::Values<u64, ClusterMember> {
        self.members.values()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.members.keys().cloned().collect()
    }

    pub fn all_connected(&self) -> bool {
        self.members.values().all(|m| m.is_connected())
    }

    pub fn all_voted(&self) -> bool {
        self.members.values().all(|m| m.voted_for_id().is_some())
    }

    /// Quorum size = floor(n/2) + 1 over the membership table, as §4.4
    /// defines it.
    pub fn quorum_size(&self) -> usize {
        self.members.len() / 2 + 1
    }

    /// The quorum position: descending-sort the reported term positions and
    /// pick the element at index `quorum_size - 1` (§4.4).
    pub fn quorum_position(&self) -> u64 {
        if self.members.is_empty() {
            return 0;
        }
        let mut positions: Vec<u64> = self.members.values().map(|m| m.term_position()).collect();
        positions.sort_by(|a, b| b.cmp(a));
        let quorum = self.quorum_size();
        positions
            .get(quorum.saturating_sub(1))
            .cloned()
            .unwrap_or(0)
    }
}
