//! Recovery pipeline (§4.7): snapshot load + per-term log replay, bringing
//! co-hosted services to a known state before the node joins the cluster as
//! a voting member.

use log_stream::{Log, LogFrame};
use log_record::LogRecord;
use timer::TimerService;

/// The callbacks the sequencer exposes to replay, shared between recovery
/// (this module) and the follower's steady-state log consumption (§4.4).
/// Implemented by `SequencerAgent`.
pub trait ReplayHandlers {
    fn on_replay_session_open(&mut self, record: &::log_record::SessionOpenRecord);
    fn on_replay_session_message(&mut self, record: &::log_record::SessionMessageRecord);
    fn on_replay_session_close(&mut self, record: &::log_record::SessionCloseRecord);
    fn on_replay_timer_event(&mut self, record: &::log_record::TimerEventRecord);
    fn on_replay_cluster_action(&mut self, record: &::log_record::ClusterActionRecord);

    /// Driven by the snapshot loader's `sequencer_state` record, which a
    /// snapshot always writes last, after every session record (§4.8's
    /// marker-begin / sessions / timers / sequencer_state / marker-end
    /// order). `next_session_id` lands at the snapshotted allocator value.
    fn on_reload_state(&mut self, next_session_id: u64);

    /// Driven by the snapshot loader's `timer` records, restoring a timer
    /// that was still pending when the snapshot was taken (§4.8).
    fn on_reload_timer(&mut self, correlation_id: u64, deadline_ms: i64);
}

/// Dispatches one decoded frame to the matching `ReplayHandlers` method,
/// shared by recovery-term replay and the follower's live log adapter poll.
pub fn dispatch_frame(frame: &LogFrame, handlers: &mut dyn ReplayHandlers) {
    match frame.record {
        LogRecord::SessionOpen(ref r) => handlers.on_replay_session_open(r),
        LogRecord::SessionMessage(ref r) => handlers.on_replay_session_message(r),
        LogRecord::SessionClose(ref r) => handlers.on_replay_session_close(r),
        LogRecord::TimerEvent(ref r) => handlers.on_replay_timer_event(r),
        LogRecord::ClusterAction(ref r) => handlers.on_replay_cluster_action(r),
    }
}

/// Pumps `adapter` until it reaches `stop_position` or the image closes
/// (§4.7 `replayTerm`). Closing before `stop_position` is a fatal protocol
/// violation (§7 class iii), signaled by returning `false`.
///
/// Takes the combined `Log` handle rather than bare `LogAdapter` so callers
/// holding a `Box<dyn Log>` (the steady-state follower path's same handle)
/// don't need trait-object upcasting, which this crate's era of Rust doesn't
/// have.
pub fn replay_term(adapter: &mut dyn Log, stop_position: u64, handlers: &mut dyn ReplayHandlers) -> bool {
    loop {
        if adapter.position() >= stop_position {
            return true;
        }
        if adapter.is_closed() {
            return false;
        }
        let mut frames = Vec::new();
        adapter.poll(256, &mut |frame| frames.push(frame));
        if frames.is_empty() && adapter.is_closed() {
            return adapter.position() >= stop_position;
        }
        for frame in &frames {
            dispatch_frame(frame, handlers);
        }
        if frames.is_empty() {
            // no progress and not closed: let the caller's idle strategy
            // back off before we spin again.
            return adapter.position() >= stop_position;
        }
    }
}

/// Attempts to cancel a timer scheduled under `correlation_id`. If the timer
/// isn't present yet (it may not have been replayed into existence by an
/// earlier record in a snapshot/term boundary), the attempt is queued for a
/// single retry once the current term finishes draining (§4.6).
pub fn try_cancel_or_queue(timers: &mut TimerService, failed: &mut Vec<u64>, correlation_id: u64) {
    if !timers.cancel(correlation_id) {
        failed.push(correlation_id);
    }
}

/// Drains `failed`, retrying each queued cancellation exactly once now that
/// the term has finished replaying (§4.6).
pub fn drain_failed_cancellations(timers: &mut TimerService, failed: &mut Vec<u64>) {
    for correlation_id in failed.drain(..) {
        timers.cancel(correlation_id);
    }
}
