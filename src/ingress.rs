//! Client request intake (§6 "Ingress"). Requests arrive as one of the
//! events below; the sequencer dispatches each to the matching handler in
//! §4.3.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminQueryKind {
    Endpoints,
    RecordingLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressEvent {
    SessionConnect {
        correlation_id: i64,
        response_stream_id: i32,
        response_channel: String,
        credentials: Vec<u8>,
    },
    ChallengeResponse {
        correlation_id: i64,
        session_id: u64,
        credentials: Vec<u8>,
    },
    SessionMessage {
        session_id: u64,
        correlation_id: i64,
        payload: Vec<u8>,
    },
    KeepAlive {
        session_id: u64,
    },
    SessionClose {
        session_id: u64,
    },
    AdminQuery {
        session_id: u64,
        correlation_id: i64,
        kind: AdminQueryKind,
    },
}

/// Whether the caller should advance its read position past the fragment
/// that produced this event (§4.3 `onSessionMessage`/§7 class i).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressAction {
    Continue,
    Abort,
}

/// Polls the client-facing transport for ingress events, bounded by the
/// transport's own fragment limit (§4.1).
pub trait Ingress {
    fn poll(&mut self, fragment_limit: usize, on_event: &mut dyn FnMut(IngressEvent) -> IngressAction) -> usize;
}
