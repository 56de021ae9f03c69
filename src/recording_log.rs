//! Recording-log metadata store (§6): `appendTerm`, `appendSnapshot`,
//! `commitLeadershipTermPosition`, `createRecoveryPlan`. This is the
//! cluster's own small durable ledger of which recording holds which term,
//! distinct from the archive that holds the bytes.

use archive::RecordingId;

/// §3 `RecoveryPlan`'s optional snapshot step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStep {
    pub recording_id: RecordingId,
    pub log_position: u64,
    pub leadership_term_id: u64,
    pub timestamp: i64,
    pub term_position: u64,
}

/// §3 `RecoveryPlan`'s per-term replay step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermStep {
    pub recording_id: RecordingId,
    pub start_position: u64,
    pub stop_position: Option<u64>,
    pub log_position: u64,
    pub leadership_term_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RecoveryPlan {
    pub snapshot: Option<SnapshotStep>,
    pub terms: Vec<TermStep>,
}

impl RecoveryPlan {
    pub fn last_log_position(&self) -> u64 {
        self.terms
            .last()
            .map(|t| t.log_position)
            .or_else(|| self.snapshot.map(|s| s.log_position))
            .unwrap_or(0)
    }

    pub fn last_term_position_appended(&self) -> u64 {
        self.snapshot.map(|s| s.term_position).unwrap_or(0)
    }
}

pub trait RecordingLog {
    fn create_recovery_plan(&self) -> RecoveryPlan;

    fn append_term(&mut self, leadership_term_id: u64, log_position: u64, timestamp: i64);

    fn append_snapshot(
        &mut self,
        recording_id: RecordingId,
        log_position: u64,
        leadership_term_id: u64,
        timestamp: i64,
        term_position: u64,
    );

    fn commit_leadership_term_position(&mut self, leadership_term_id: u64, log_position: u64);
}

/// In-memory recording log used by tests and scenario fixtures.
#[derive(Default)]
pub struct MemoryRecordingLog {
    plan: RecoveryPlan,
}

impl MemoryRecordingLog {
    pub fn new() -> MemoryRecordingLog {
        MemoryRecordingLog {
            plan: RecoveryPlan::default(),
        }
    }

    pub fn seed(&mut self, plan: RecoveryPlan) {
        self.plan = plan;
    }
}

impl RecordingLog for MemoryRecordingLog {
    fn create_recovery_plan(&self) -> RecoveryPlan {
        self.plan.clone()
    }

    fn append_term(&mut self, leadership_term_id: u64, log_position: u64, _timestamp: i64) {
        self.plan.terms.push(TermStep {
            recording_id: 0,
            start_position: log_position,
            stop_position: None,
            log_position: log_position,
            leadership_term_id: leadership_term_id,
        });
    }

    fn append_snapshot(
        &mut self,
        recording_id: RecordingId,
        log_position: u64,
        leadership_term_id: u64,
        timestamp: i64,
        term_position: u64,
    ) {
        self.plan.snapshot = Some(SnapshotStep {
            recording_id: recording_id,
            log_position: log_position,
            leadership_term_id: leadership_term_id,
            timestamp: timestamp,
            term_position: term_position,
        });
    }

    fn commit_leadership_term_position(&mut self, leadership_term_id: u64, log_position: u64) {
        if let Some(last) = self.plan.terms.last_mut() {
            if last.leadership_term_id == leadership_term_id {
                last.stop_position = Some(log_position);
            }
        }
    }
}
