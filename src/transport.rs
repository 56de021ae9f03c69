//! Transport capability set (§6): add/remove publications & subscriptions,
//! obtain images, read counters, and invoke the conductor for cooperative
//! progress between spin-idle polls. The actual pub/sub wire protocol is out
//! of scope (§1) — this crate only needs the shape of the handles it is
//! lent, the way the teacher's `Peer`/`PeerHandle` only needs a `SocketAddr`
//! and doesn't implement UDP itself.

pub type PublicationHandle = u64;
pub type SubscriptionHandle = u64;
pub type ImageHandle = u64;
pub type CounterId = u32;

/// A consumer's view of one publication session (§ glossary "Image").
pub trait Image {
    fn position(&self) -> u64;
    fn is_closed(&self) -> bool;
    fn session_id(&self) -> u64;
}

/// Add/remove publications & subscriptions, resolve images, read counters,
/// and pump the conductor. Implemented by the transport client the runner
/// owns; the sequencer only ever borrows handles out of it.
pub trait Transport {
    fn add_exclusive_publication(&mut self, channel: &str, stream_id: i32) -> PublicationHandle;
    fn add_publication(&mut self, channel: &str, stream_id: i32) -> PublicationHandle;
    fn add_subscription(&mut self, channel: &str, stream_id: i32) -> SubscriptionHandle;
    fn remove_publication(&mut self, handle: PublicationHandle);
    fn remove_subscription(&mut self, handle: SubscriptionHandle);

    fn is_publication_connected(&self, handle: PublicationHandle) -> bool;

    fn image_for_session(&self, subscription: SubscriptionHandle, session_id: i64) -> Option<ImageHandle>;

    fn counter_value(&self, id: CounterId) -> i64;
    fn set_counter_value(&mut self, id: CounterId, value: i64);
    fn allocate_counter(&mut self, label: &str) -> CounterId;

    /// Cooperative progress hook invoked between polls during every
    /// spin-idle (§5). Never blocks.
    fn conductor_duty_cycle(&mut self) -> i32;
}

/// In-memory transport used by tests: every publication/subscription is
/// connected the instant it's added, counters are a plain `Vec`.
#[derive(Default)]
pub struct MemoryTransport {
    next_handle: u64,
    counters: Vec<i64>,
}

impl MemoryTransport {
    pub fn new() -> MemoryTransport {
        MemoryTransport::default()
    }
}

impl Transport for MemoryTransport {
    fn add_exclusive_publication(&mut self, _channel: &str, _stream_id: i32) -> PublicationHandle {
        self.next_handle += 1;
        self.next_handle
    }

    fn add_publication(&mut self, _channel: &str, _stream_id: i32) -> PublicationHandle {
        self.next_handle += 1;
        self.next_handle
    }

    fn add_subscription(&mut self, _channel: &str, _stream_id: i32) -> SubscriptionHandle {
        self.next_handle += 1;
        self.next_handle
    }

    fn remove_publication(&mut self, _handle: PublicationHandle) {}

    fn remove_subscription(&mut self, _handle: SubscriptionHandle) {}

    fn is_publication_connected(&self, _handle: PublicationHandle) -> bool {
        true
    }

    fn image_for_session(&self, subscription: SubscriptionHandle, session_id: i64) -> Option<ImageHandle> {
        Some(subscription + session_id as u64)
    }

    fn counter_value(&self, id: CounterId) -> i64 {
        self.counters.get(id as usize).cloned().unwrap_or(0)
    }

    fn set_counter_value(&mut self, id: CounterId, value: i64) {
        let id = id as usize;
        if id >= self.counters.len() {
            self.counters.resize(id + 1, 0);
        }
        self.counters[id] = value;
    }

    fn allocate_counter(&mut self, _label: &str) -> CounterId {
        self.counters.push(0);
        (self.counters.len() - 1) as CounterId
    }

    fn conductor_duty_cycle(&mut self) -> i32 {
        0
    }
}
