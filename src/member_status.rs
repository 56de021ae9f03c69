//! Peer-to-peer member-status RPCs (§6): request_vote / vote /
//! appended_position / commit_position. Grounded on the teacher's
//! `Peer::send_request_vote`/`construct_request_vote` (`server/peer.rs`):
//! build a capnp param struct, ship it, decode the reply into a plain
//! struct. Here the publisher only builds+encodes (the send itself is the
//! out-of-scope wire/transport concern); the adapter only decodes.

use capnp::message::{Builder, HeapAllocator};

use member_status_capnp::{appended_position, commit_position, request_vote, vote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestVoteMessage {
    pub term_id: u64,
    pub last_base_log_position: u64,
    pub last_term_position: u64,
    pub candidate_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteMessage {
    pub term_id: u64,
    pub last_base_log_position: u64,
    pub last_term_position: u64,
    pub candidate_id: u64,
    pub follower_id: u64,
    pub vote_granted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendedPositionMessage {
    pub term_position: u64,
    pub term_id: u64,
    pub follower_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitPositionMessage {
    pub term_position: u64,
    pub term_id: u64,
    pub leader_id: u64,
    pub log_session_id: i64,
}

/// Any member-status message, as delivered to the adapter's dispatch
/// callback (§4.1 "polls member-status").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatusMessage {
    RequestVote(RequestVoteMessage),
    Vote(VoteMessage),
    AppendedPosition(AppendedPositionMessage),
    CommitPosition(CommitPositionMessage),
}

pub fn encode_request_vote(msg: &RequestVoteMessage) -> Builder<HeapAllocator> {
    let mut message = Builder::new_default();
    {
        let mut builder = message.init_root::<request_vote::Builder>();
        builder.set_term_id(msg.term_id);
        builder.set_last_base_log_position(msg.last_base_log_position);
        builder.set_last_term_position(msg.last_term_position);
        builder.set_candidate_id(msg.candidate_id);
    }
    message
}

pub fn decode_request_vote(reader: request_vote::Reader) -> RequestVoteMessage {
    RequestVoteMessage {
        term_id: reader.get_term_id(),
        last_base_log_position: reader.get_last_base_log_position(),
        last_term_position: reader.get_last_term_position(),
        candidate_id: reader.get_candidate_id(),
    }
}

pub fn encode_vote(msg: &VoteMessage) -> Builder<HeapAllocator> {
    let mut message = Builder::new_default();
    {
        let mut builder = message.init_root::<vote::Builder>();
        builder.set_term_id(msg.term_id);
        builder.set_last_base_log_position(msg.last_base_log_position);
        builder.set_last_term_position(msg.last_term_position);
        builder.set_candidate_id(msg.candidate_id);
        builder.set_follower_id(msg.follower_id);
        builder.set_vote_granted(msg.vote_granted);
    }
    message
}

pub fn decode_vote(reader: vote::Reader) -> VoteMessage {
    VoteMessage {
        term_id: reader.get_term_id(),
        last_base_log_position: reader.get_last_base_log_position(),
        last_term_position: reader.get_last_term_position(),
        candidate_id: reader.get_candidate_id(),
        follower_id: reader.get_follower_id(),
        vote_granted: reader.get_vote_granted(),
    }
}

pub fn encode_appended_position(msg: &AppendedPositionMessage) -> Builder<HeapAllocator> {
    let mut message = Builder::new_default();
    {
        let mut builder = message.init_root::<appended_position::Builder>();
        builder.set_term_position(msg.term_position);
        builder.set_term_id(msg.term_id);
        builder.set_follower_id(msg.follower_id);
    }
    message
}

pub fn decode_appended_position(reader: appended_position::Reader) -> AppendedPositionMessage {
    AppendedPositionMessage {
        term_position: reader.get_term_position(),
        term_id: reader.get_term_id(),
        follower_id: reader.get_follower_id(),
    }
}

pub fn encode_commit_position(msg: &CommitPositionMessage) -> Builder<HeapAllocator> {
    let mut message = Builder::new_default();
    {
        let mut builder = message.init_root::<commit_position::Builder>();
        builder.set_term_position(msg.term_position);
        builder.set_term_id(msg.term_id);
        builder.set_leader_id(msg.leader_id);
        builder.set_log_session_id(msg.log_session_id);
    }
    message
}

pub fn decode_commit_position(reader: commit_position::Reader) -> CommitPositionMessage {
    CommitPositionMessage {
        term_position: reader.get_term_position(),
        term_id: reader.get_term_id(),
        leader_id: reader.get_leader_id(),
        log_session_id: reader.get_log_session_id(),
    }
}

/// Sends member-status RPCs to peers. A failed `send_request_vote` is an
/// environmental fault (§7 class iv); the other sends are best-effort and
/// simply retried next tick if they fail.
pub trait MemberStatusPublisher {
    fn send_request_vote(&mut self, peer_id: u64, msg: RequestVoteMessage) -> bool;
    fn send_vote(&mut self, peer_id: u64, msg: VoteMessage) -> bool;
    fn send_appended_position(&mut self, leader_id: u64, msg: AppendedPositionMessage) -> bool;
    fn broadcast_commit_position(&mut self, msg: CommitPositionMessage) -> bool;
}

/// Polls for inbound member-status messages, delivering each to the
/// sequencer's dispatch in receipt order.
pub trait MemberStatusAdapter {
    fn poll(&mut self, limit: usize, on_message: &mut dyn FnMut(MemberStatusMessage)) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_vote_round_trips_through_capnp() {
        let original = RequestVoteMessage {
            term_id: 7,
            last_base_log_position: 100,
            last_term_position: 42,
            candidate_id: 3,
        };
        let message = encode_request_vote(&original);
        let reader = message.get_root_as_reader::<request_vote::Reader>().unwrap();
        let decoded = decode_request_vote(reader);
        assert_eq!(decoded, original);
    }

    #[test]
    fn commit_position_round_trips_through_capnp() {
        let original = CommitPositionMessage {
            term_position: 55,
            term_id: 2,
            leader_id: 1,
            log_session_id: -1,
        };
        let message = encode_commit_position(&original);
        let reader = message.get_root_as_reader::<commit_position::Reader>().unwrap();
        let decoded = decode_commit_position(reader);
        assert_eq!(decoded, original);
    }
}
