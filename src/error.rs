use std::error::Error;
use std::fmt;

/// Faults that terminate the sequencer agent outright (§7, class iii/iv).
///
/// The outer runner is expected to catch a `SequencerError::Fatal` bubbling
/// out of `do_work` and tear the node down; nothing in this crate attempts
/// to recover from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalReason {
    AckCountExceedsServiceCount { expected: usize, got: usize },
    AckLogPositionMismatch { expected: u64, got: u64 },
    InvalidActionForState,
    ReplaySessionIdMismatch { expected: u64, got: u64 },
    ReplayBasePositionMismatch { expected: u64, got: u64 },
    RecoveryImageClosedMidStream,
    RecordingStoppedUnexpectedly,
    HeartbeatTimeout,
    TaskInterrupted,
    RequestVoteSendFailed { peer_id: u64 },
    RecordingIdNotFound { recording_id: i64 },
}

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FatalReason::AckCountExceedsServiceCount { expected, got } => write!(
                f,
                "service ack count {} exceeds configured service count {}",
                got, expected
            ),
            FatalReason::AckLogPositionMismatch { expected, got } => write!(
                f,
                "service ack log position {} does not match expected {}",
                got, expected
            ),
            FatalReason::InvalidActionForState => {
                write!(f, "cluster action is not valid for the current consensus state")
            }
            FatalReason::ReplaySessionIdMismatch { expected, got } => write!(
                f,
                "replay session id {} does not match term step index {}",
                got, expected
            ),
            FatalReason::ReplayBasePositionMismatch { expected, got } => write!(
                f,
                "replay base log position {} does not match expected {}",
                got, expected
            ),
            FatalReason::RecoveryImageClosedMidStream => {
                write!(f, "recovery image closed before reaching its expected end position")
            }
            FatalReason::RecordingStoppedUnexpectedly => {
                write!(f, "archive recording stopped unexpectedly")
            }
            FatalReason::HeartbeatTimeout => {
                write!(f, "no commit-position heartbeat received from the leader in time")
            }
            FatalReason::TaskInterrupted => write!(f, "host task was interrupted during a spin-idle"),
            FatalReason::RequestVoteSendFailed { peer_id } => {
                write!(f, "failed to send request_vote to peer {}", peer_id)
            }
            FatalReason::RecordingIdNotFound { recording_id } => {
                write!(f, "recording id {} not found in the archive", recording_id)
            }
        }
    }
}

/// Top level crate error type.
///
/// Back-pressure (§7 class i) is deliberately *not* a variant here: it is
/// signaled to callers as a plain `bool`/`Retry` return value and never
/// unwinds through `?`, matching the policy in §7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// A client session hit its configured concurrency limit (§4.3).
    SessionLimitExceeded,
    /// The authenticator rejected a session (§4.3).
    AuthenticationRejected,
    /// A session's activity timeout elapsed (§4.3).
    SessionTimedOut,
    /// Protocol or environmental fault; terminates the agent.
    Fatal(FatalReason),
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SequencerError::SessionLimitExceeded => write!(f, "session limit exceeded"),
            SequencerError::AuthenticationRejected => write!(f, "authentication rejected"),
            SequencerError::SessionTimedOut => write!(f, "session timed out"),
            SequencerError::Fatal(ref reason) => write!(f, "fatal: {}", reason),
        }
    }
}

impl Error for SequencerError {
    fn description(&self) -> &str {
        match *self {
            SequencerError::SessionLimitExceeded => "session limit exceeded",
            SequencerError::AuthenticationRejected => "authentication rejected",
            SequencerError::SessionTimedOut => "session timed out",
            SequencerError::Fatal(_) => "fatal sequencer fault",
        }
    }
}

impl From<FatalReason> for SequencerError {
    fn from(reason: FatalReason) -> SequencerError {
        SequencerError::Fatal(reason)
    }
}

pub type Result<T> = ::std::result::Result<T, SequencerError>;
