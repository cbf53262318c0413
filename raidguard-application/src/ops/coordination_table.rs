// Coordination table
// Deaths the early hook already restored. The late hook consumes the record to learn
// which slots were managed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use raidguard_domain::{SessionId, SlotSet};
use tracing::{debug, warn};

pub const DEFAULT_COORDINATION_TTL: Duration = Duration::from_secs(300);

static PROCESS_TABLE: OnceLock<Arc<CoordinationTable>> = OnceLock::new();

#[derive(Debug, Clone)]
struct Record {
    managed_slots: SlotSet,
    owner: ThreadId,
    completed_at: Instant,
}

#[derive(Debug)]
pub struct CoordinationTable {
    ttl: Duration,
    entries: Mutex<HashMap<SessionId, Record>>,
}

impl CoordinationTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Shared table for the whole process. The TTL of the first caller wins.
    pub fn process_wide(ttl: Duration) -> Arc<Self> {
        PROCESS_TABLE
            .get_or_init(|| Arc::new(Self::new(ttl)))
            .clone()
    }

    pub fn mark_restored(&self, session_id: &SessionId, managed_slots: SlotSet) {
        let mut entries = self.lock();
        Self::sweep_locked(&mut entries, self.ttl);
        entries.insert(
            session_id.clone(),
            Record {
                managed_slots,
                owner: thread::current().id(),
                completed_at: Instant::now(),
            },
        );
        debug!(session_id = %session_id, "restoration recorded");
    }

    /// Removes and returns the managed slots recorded for `session_id`, if any.
    /// Check and removal happen under one lock, so at most one caller gets the set.
    pub fn try_consume(&self, session_id: &SessionId) -> Option<SlotSet> {
        let record = self.lock().remove(session_id)?;
        if record.completed_at.elapsed() > self.ttl {
            warn!(
                session_id = %session_id,
                age_secs = record.completed_at.elapsed().as_secs(),
                "stale coordination record discarded"
            );
            return None;
        }
        let current = thread::current().id();
        if record.owner != current {
            warn!(
                session_id = %session_id,
                owner = ?record.owner,
                consumer = ?current,
                "coordination record consumed on a different thread than it was written"
            );
        }
        Some(record.managed_slots)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops records older than the TTL. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        Self::sweep_locked(&mut self.lock(), self.ttl)
    }

    fn sweep_locked(entries: &mut HashMap<SessionId, Record>, ttl: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, record| record.completed_at.elapsed() <= ttl);
        let swept = before - entries.len();
        if swept > 0 {
            warn!(swept, "swept stale coordination records");
        }
        swept
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Record>> {
        // A panic elsewhere cannot leave a half-written record, so the map stays usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CoordinationTable {
    fn default() -> Self {
        Self::new(DEFAULT_COORDINATION_TTL)
    }
}
