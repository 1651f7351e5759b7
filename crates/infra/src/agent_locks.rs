use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use vanflow_core::AgentId;

/// Registry of per-agent dispatch locks.
///
/// Dispatches for different agents proceed fully in parallel; dispatches
/// targeting the same agent serialize on that agent's mutex. Entries are
/// created on first use and never pruned (one mutex per agent ever seen).
#[derive(Debug, Default)]
pub struct AgentLocks {
    inner: Mutex<HashMap<AgentId, Arc<Mutex<()>>>>,
}

impl AgentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding one agent's check-then-commit critical section.
    pub fn lock_for(&self, agent_id: AgentId) -> Arc<Mutex<()>> {
        self.inner.lock().entry(agent_id).or_default().clone()
    }
}
