//! Node and allocation records as seen by the reconciler.
//!
//! These are read-only snapshots owned by cluster state. The reconciler
//! never mutates them; it only classifies and indexes them.

use chrono::{DateTime, Utc};
use convoy_id::{AllocId, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};
use crate::name::AllocName;

// =============================================================================
// Nodes
// =============================================================================

/// Node status as last recorded by the servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Registered but not yet eligible.
    Initializing,
    Ready,
    /// Declared permanently gone.
    Down,
    /// Missed heartbeats but not yet declared down.
    Disconnected,
}

/// Evacuation settings attached to a node being drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainStrategy {
    /// How long allocations may keep running before being forced off.
    /// Negative means "force immediately", zero means "no deadline".
    pub deadline_secs: i64,

    /// Absolute time at which remaining allocations are stopped.
    pub force_deadline: Option<DateTime<Utc>>,

    pub started_at: DateTime<Utc>,

    /// Leave system-job allocations in place.
    #[serde(default)]
    pub ignore_system_jobs: bool,
}

/// A client node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub status: NodeStatus,
    #[serde(default)]
    pub drain_strategy: Option<DrainStrategy>,
}

impl Node {
    pub fn new(id: NodeId, status: NodeStatus) -> Self {
        Self {
            id,
            status,
            drain_strategy: None,
        }
    }

    /// Returns true if the node is being evacuated.
    pub fn is_draining(&self) -> bool {
        self.drain_strategy.is_some()
    }

    /// Returns true if the node is reporting normally.
    pub fn is_ready(&self) -> bool {
        matches!(self.status, NodeStatus::Ready)
    }
}

// =============================================================================
// Allocations
// =============================================================================

/// Status reported by the client running the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Pending,
    Running,
    Complete,
    Failed,
    /// The node stopped reporting while the allocation was live.
    Unknown,
}

impl ClientStatus {
    /// Returns true for statuses that need no further corrective action.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Status the servers want the allocation to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredStatus {
    Run,
    Stop,
    Evict,
}

/// Transitions requested by upstream policy, such as drain orchestration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredTransition {
    /// Relocate the allocation regardless of its node's health.
    #[serde(default)]
    pub migrate: bool,
}

/// One placed instance of a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocId,
    pub job_id: String,
    pub task_group: String,
    /// `<job>.<group>[<index>]`
    pub name: String,
    pub node_id: NodeId,
    pub client_status: ClientStatus,
    pub desired_status: DesiredStatus,
    #[serde(default)]
    pub desired_transition: DesiredTransition,
}

impl Allocation {
    /// Returns true if the client reported the allocation finished.
    pub fn is_terminal(&self) -> bool {
        self.client_status.is_terminal()
    }

    /// Returns true if upstream policy asked for this allocation to move.
    pub fn should_migrate(&self) -> bool {
        self.desired_transition.migrate
    }

    /// Decode the allocation's name.
    pub fn alloc_name(&self) -> ReconcileResult<AllocName> {
        AllocName::parse(&self.name, &self.job_id, &self.task_group).map_err(|reason| {
            ReconcileError::MalformedAllocName {
                alloc_id: self.id,
                name: self.name.clone(),
                reason,
            }
        })
    }

    /// The allocation's slot within its task group.
    pub fn index(&self) -> ReconcileResult<u32> {
        self.alloc_name().map(|n| n.index())
    }
}
