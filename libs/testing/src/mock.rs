//! Mock nodes and allocations.

use chrono::Utc;
use convoy_reconcile::{
    AllocId, Allocation, ClientStatus, DesiredStatus, DesiredTransition, DrainStrategy, Node,
    NodeId, NodeStatus,
};

/// A node with the given status and a fresh ID.
pub fn node(status: NodeStatus) -> Node {
    Node::new(NodeId::new(), status)
}

/// A ready node with an active drain.
pub fn draining_node() -> Node {
    let mut node = node(NodeStatus::Ready);
    node.drain_strategy = Some(DrainStrategy {
        deadline_secs: 3600,
        force_deadline: None,
        started_at: Utc::now(),
        ignore_system_jobs: false,
    });
    node
}

/// Start building a running allocation `job.group[index]` on a fresh node.
pub fn alloc(job_id: &str, task_group: &str, index: u32) -> AllocBuilder {
    AllocBuilder::new(job_id, task_group, index)
}

/// Builder for [`Allocation`] fixtures.
#[derive(Debug, Clone)]
pub struct AllocBuilder {
    alloc: Allocation,
}

impl AllocBuilder {
    pub fn new(job_id: &str, task_group: &str, index: u32) -> Self {
        Self {
            alloc: Allocation {
                id: AllocId::new(),
                job_id: job_id.to_string(),
                task_group: task_group.to_string(),
                name: format!("{job_id}.{task_group}[{index}]"),
                node_id: NodeId::new(),
                client_status: ClientStatus::Running,
                desired_status: DesiredStatus::Run,
                desired_transition: DesiredTransition::default(),
            },
        }
    }

    pub fn on(mut self, node_id: NodeId) -> Self {
        self.alloc.node_id = node_id;
        self
    }

    pub fn status(mut self, status: ClientStatus) -> Self {
        self.alloc.client_status = status;
        self
    }

    pub fn desired(mut self, status: DesiredStatus) -> Self {
        self.alloc.desired_status = status;
        self
    }

    pub fn migrate(mut self) -> Self {
        self.alloc.desired_transition.migrate = true;
        self
    }

    /// Override the generated name, e.g. to inject a malformed one.
    pub fn raw_name(mut self, name: &str) -> Self {
        self.alloc.name = name.to_string();
        self
    }

    pub fn build(self) -> Allocation {
        self.alloc
    }
}
