//! Client response path (§6 "Egress"). Session errors (§7 class ii) are
//! delivered here before the session is reaped.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EgressErrorCode {
    SessionLimit,
    AuthenticationRejected,
}

pub trait Egress {
    /// Sends a session-level error to the client, best-effort; the caller
    /// does not retry a failed error send (the session is being dropped
    /// either way).
    fn send_error(&mut self, session_id: u64, correlation_id: i64, code: EgressErrorCode) -> bool;

    /// Sends an admin-query reply. Returns whether the send succeeded so the
    /// caller can retry next tick on failure (§4.3 `onAdminQuery`).
    fn send_admin_response(&mut self, session_id: u64, correlation_id: i64, detail: &str) -> bool;
}
