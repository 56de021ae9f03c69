//! Service control pair (§6): downward `joinLog`, upward `ack`. Co-hosted
//! service replicas are out of scope (§1); this crate only sends them join
//! instructions and counts their acknowledgements.

use role::ControlToggle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLog {
    pub leadership_term_id: u64,
    pub commit_position_counter_id: u32,
    pub session_id: i64,
    pub stream_id: i32,
    pub channel: String,
}

/// An ACK from one service replica (§4.5). `action` is `None` for a plain
/// log-position ack and `Some(_)` for a cluster-action ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceAck {
    pub log_position: u64,
    pub leadership_term_id: u64,
    pub service_id: u32,
    pub action: Option<ControlToggle>,
}

pub trait ServiceControlPublisher {
    fn publish_join_log(&mut self, join_log: &JoinLog) -> bool;
}

pub trait ServiceControlAdapter {
    /// Drains pending service ACKs, delivering each to `on_ack` in receipt
    /// order. Called every slow tick (§4.1).
    fn poll(&mut self, limit: usize, on_ack: &mut dyn FnMut(ServiceAck)) -> usize;
}

/// Counts ACKs against the configured service count, enforcing the §8
/// invariant `service_ack_count <= service_count` and raising the §7
/// class-iii fault if a caller ever manages to violate it.
pub struct ServiceAckCounter {
    service_count: usize,
    count: usize,
}

impl ServiceAckCounter {
    pub fn new(service_count: usize) -> ServiceAckCounter {
        ServiceAckCounter {
            service_count: service_count,
            count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn service_count(&self) -> usize {
        self.service_count
    }

    pub fn is_complete(&self) -> bool {
        self.count >= self.service_count
    }

    /// Records one more ACK. Returns `Err` (a fatal protocol violation) if
    /// this ACK would push the count past the configured service count.
    pub fn record(&mut self) -> ::std::result::Result<(), ()> {
        if self.count >= self.service_count {
            return Err(());
        }
        self.count += 1;
        Ok(())
    }
}
