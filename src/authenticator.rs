//! Authenticator capability set (§6): credential verification itself is out
//! of scope (§1) — this crate drives whatever authenticator the host
//! application supplies through the session-proxy (§3.3/§9 "dynamic
//! dispatch").

use session::SessionProxy;

pub trait Authenticator {
    /// Called from `onSessionConnect` before a session is placed in the
    /// pending list (§4.3).
    fn on_connect_request(&mut self, session_id: u64, credentials: &[u8], now_ms: i64);

    /// Called once per slow tick for each pending session whose response
    /// publication just connected (§4.3 pending-session pump step 1).
    fn on_process_connected_session(&mut self, proxy: &mut dyn SessionProxy, now_ms: i64);

    /// Called once per slow tick for each pending session in CHALLENGED
    /// whose response publication is connected (§4.3 pending-session pump
    /// step 2).
    fn on_process_challenged_session(&mut self, proxy: &mut dyn SessionProxy, now_ms: i64);

    /// Called from `onChallengeResponse` (§4.3).
    fn on_challenge_response(&mut self, session_id: u64, credentials: &[u8], proxy: &mut dyn SessionProxy, now_ms: i64);
}

/// Trivial authenticator that accepts every connecting session immediately,
/// used by tests and as a sane default for clusters that don't need
/// challenge-based auth.
#[derive(Default)]
pub struct AcceptAllAuthenticator;

impl Authenticator for AcceptAllAuthenticator {
    fn on_connect_request(&mut self, _session_id: u64, _credentials: &[u8], _now_ms: i64) {}

    fn on_process_connected_session(&mut self, proxy: &mut dyn SessionProxy, _now_ms: i64) {
        proxy.authenticate();
    }

    fn on_process_challenged_session(&mut self, proxy: &mut dyn SessionProxy, _now_ms: i64) {
        proxy.authenticate();
    }

    fn on_challenge_response(
        &mut self,
        _session_id: u64,
        _credentials: &[u8],
        proxy: &mut dyn SessionProxy,
        _now_ms: i64,
    ) {
        proxy.authenticate();
    }
}
