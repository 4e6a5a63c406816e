//! Tainted/unknown classification.
//!
//! Splits an allocation set into five disjoint partitions based on each
//! allocation's status, its migrate flag, and the health of its node:
//!
//! | Class           | Meaning                                              |
//! |-----------------|------------------------------------------------------|
//! | `Untainted`     | No corrective action needed                          |
//! | `Migrate`       | Upstream policy asked for relocation                 |
//! | `Lost`          | Node is gone; the allocation must be replaced        |
//! | `Unknown`       | Node stopped reporting; hold until it returns or times out |
//! | `Reconnectable` | Was unknown, node is back; resume or replace upstream |
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Terminal allocations are untainted, whatever their node looks like.
//! 2. Allocations flagged for migration migrate, even if their node record
//!    is gone.
//! 3. Allocations whose node is absent, nil, or down are lost.
//! 4. Allocations on a disconnected node become unknown, unless they are
//!    already unknown. Groups that do not tolerate disconnects treat them
//!    as lost instead.
//! 5. Unknown allocations on a ready node are reconnectable.
//! 6. Everything else is untainted.

use convoy_id::{AllocId, NodeId};
use tracing::{debug, instrument, trace};

use crate::alloc_set::AllocSet;
use crate::config::ReconcileConfig;
use crate::model::{Allocation, ClientStatus, NodeStatus};
use crate::node_view::NodeLookup;

/// Classification of a single allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllocClass {
    Untainted,
    Migrate,
    Lost,
    Unknown,
    Reconnectable,
}

impl AllocClass {
    pub const ALL: [AllocClass; 5] = [
        AllocClass::Untainted,
        AllocClass::Migrate,
        AllocClass::Lost,
        AllocClass::Unknown,
        AllocClass::Reconnectable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untainted => "untainted",
            Self::Migrate => "migrate",
            Self::Lost => "lost",
            Self::Unknown => "unknown",
            Self::Reconnectable => "reconnectable",
        }
    }
}

impl std::fmt::Display for AllocClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five disjoint partitions of a classified allocation set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaintedPartition {
    pub untainted: AllocSet,
    pub migrate: AllocSet,
    pub lost: AllocSet,
    pub unknown: AllocSet,
    pub reconnectable: AllocSet,
}

impl TaintedPartition {
    /// Borrow the partition for `class`.
    pub fn get(&self, class: AllocClass) -> &AllocSet {
        match class {
            AllocClass::Untainted => &self.untainted,
            AllocClass::Migrate => &self.migrate,
            AllocClass::Lost => &self.lost,
            AllocClass::Unknown => &self.unknown,
            AllocClass::Reconnectable => &self.reconnectable,
        }
    }

    fn get_mut(&mut self, class: AllocClass) -> &mut AllocSet {
        match class {
            AllocClass::Untainted => &mut self.untainted,
            AllocClass::Migrate => &mut self.migrate,
            AllocClass::Lost => &mut self.lost,
            AllocClass::Unknown => &mut self.unknown,
            AllocClass::Reconnectable => &mut self.reconnectable,
        }
    }

    /// Total number of allocations across all partitions.
    pub fn len(&self) -> usize {
        AllocClass::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find which partition holds an allocation.
    pub fn class_of(&self, id: &AllocId) -> Option<AllocClass> {
        AllocClass::ALL
            .into_iter()
            .find(|c| self.get(*c).contains(id))
    }

    /// Allocations whose current placement cannot be kept: migrating and
    /// lost. The driver sizes replacement placements from this.
    pub fn needs_replacement(&self) -> usize {
        self.migrate.len() + self.lost.len()
    }
}

/// Classifies allocations against a node snapshot.
#[derive(Debug, Clone, Default)]
pub struct TaintedClassifier {
    config: ReconcileConfig,
}

impl TaintedClassifier {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Classify one allocation.
    pub fn classify<N>(&self, alloc: &Allocation, nodes: &N) -> AllocClass
    where
        N: NodeLookup + ?Sized,
    {
        if alloc.is_terminal() {
            return AllocClass::Untainted;
        }

        if alloc.should_migrate() {
            return AllocClass::Migrate;
        }

        // Absent and nil nodes are unknowable; assume the worst.
        let Some(node) = nodes.node(&alloc.node_id) else {
            return AllocClass::Lost;
        };

        match (node.status, alloc.client_status) {
            (NodeStatus::Down, _) => AllocClass::Lost,

            // Already held as unknown; nothing new to do until the node
            // comes back or is declared down.
            (NodeStatus::Disconnected, ClientStatus::Unknown) => AllocClass::Untainted,
            (NodeStatus::Disconnected, _) if self.config.supports_disconnected_clients => {
                AllocClass::Unknown
            }
            (NodeStatus::Disconnected, _) => AllocClass::Lost,

            (NodeStatus::Ready, ClientStatus::Unknown) => AllocClass::Reconnectable,

            (NodeStatus::Ready | NodeStatus::Initializing, _) => AllocClass::Untainted,
        }
    }

    /// Partition an allocation set. Every input allocation lands in exactly
    /// one partition.
    #[instrument(skip_all, fields(allocs = allocs.len()))]
    pub fn partition<N>(&self, allocs: &AllocSet, nodes: &N) -> TaintedPartition
    where
        N: NodeLookup + ?Sized,
    {
        let mut out = TaintedPartition::default();

        for alloc in allocs {
            let class = self.classify(alloc, nodes);
            trace!(
                alloc_id = %alloc.id,
                node_id = %alloc.node_id,
                client_status = ?alloc.client_status,
                class = %class,
                "Classified allocation"
            );
            out.get_mut(class).insert(alloc.clone());
        }

        debug!(
            untainted = out.untainted.len(),
            migrate = out.migrate.len(),
            lost = out.lost.len(),
            unknown = out.unknown.len(),
            reconnectable = out.reconnectable.len(),
            "Partitioned allocations by node health"
        );

        out
    }
}

/// Partition `allocs` with the default configuration.
pub fn filter_by_tainted_and_unknown<N>(allocs: &AllocSet, nodes: &N) -> TaintedPartition
where
    N: NodeLookup + ?Sized,
{
    TaintedClassifier::default().partition(allocs, nodes)
}

/// Collect the IDs of nodes referenced by live allocations in `allocs`
/// that are tainted: down, disconnected, draining, nil or absent.
pub fn tainted_node_ids<N>(allocs: &AllocSet, nodes: &N) -> Vec<NodeId>
where
    N: NodeLookup + ?Sized,
{
    let mut ids: Vec<NodeId> = allocs
        .iter()
        .filter(|a| !a.is_terminal())
        .map(|a| a.node_id)
        .filter(|id| match nodes.node(id) {
            None => true,
            Some(node) => {
                node.is_draining()
                    || matches!(node.status, NodeStatus::Down | NodeStatus::Disconnected)
            }
        })
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{DesiredStatus, DesiredTransition, DrainStrategy, Node};
    use crate::node_view::NodeView;

    struct Fixture {
        view: NodeView,
        ready: NodeId,
        draining: NodeId,
        down: NodeId,
        disconnected: NodeId,
        initializing: NodeId,
        nil: NodeId,
    }

    fn fixture() -> Fixture {
        let ready = Node::new(NodeId::new(), NodeStatus::Ready);
        let mut draining = Node::new(NodeId::new(), NodeStatus::Ready);
        draining.drain_strategy = Some(DrainStrategy {
            deadline_secs: 60,
            force_deadline: None,
            started_at: Utc::now(),
            ignore_system_jobs: false,
        });
        let down = Node::new(NodeId::new(), NodeStatus::Down);
        let disconnected = Node::new(NodeId::new(), NodeStatus::Disconnected);
        let initializing = Node::new(NodeId::new(), NodeStatus::Initializing);
        let nil = NodeId::new();

        let ids = (ready.id, draining.id, down.id, disconnected.id, initializing.id);
        let mut view: NodeView = vec![ready, draining, down, disconnected, initializing]
            .into_iter()
            .collect();
        view.insert_nil(nil);

        Fixture {
            view,
            ready: ids.0,
            draining: ids.1,
            down: ids.2,
            disconnected: ids.3,
            initializing: ids.4,
            nil,
        }
    }

    fn alloc(node_id: NodeId, status: ClientStatus, migrate: bool) -> Allocation {
        Allocation {
            id: AllocId::new(),
            job_id: "batch".to_string(),
            task_group: "work".to_string(),
            name: "batch.work[0]".to_string(),
            node_id,
            client_status: status,
            desired_status: DesiredStatus::Run,
            desired_transition: DesiredTransition { migrate },
        }
    }

    #[test]
    fn test_terminal_always_untainted() {
        let f = fixture();
        let c = TaintedClassifier::default();
        for node in [f.ready, f.draining, f.down, f.disconnected, f.nil, NodeId::new()] {
            for status in [ClientStatus::Complete, ClientStatus::Failed] {
                for migrate in [false, true] {
                    let a = alloc(node, status, migrate);
                    assert_eq!(c.classify(&a, &f.view), AllocClass::Untainted);
                }
            }
        }
    }

    #[test]
    fn test_migrate_beats_node_state() {
        let f = fixture();
        let c = TaintedClassifier::default();
        for node in [f.ready, f.draining, f.down, f.disconnected, f.nil, NodeId::new()] {
            let a = alloc(node, ClientStatus::Running, true);
            assert_eq!(c.classify(&a, &f.view), AllocClass::Migrate);
        }
    }

    #[test]
    fn test_absent_node_is_lost() {
        let f = fixture();
        let a = alloc(NodeId::new(), ClientStatus::Running, false);
        assert_eq!(TaintedClassifier::default().classify(&a, &f.view), AllocClass::Lost);
    }

    #[test]
    fn test_nil_node_is_lost() {
        let f = fixture();
        let a = alloc(f.nil, ClientStatus::Pending, false);
        assert_eq!(TaintedClassifier::default().classify(&a, &f.view), AllocClass::Lost);
    }

    #[test]
    fn test_draining_without_migrate_is_untainted() {
        let f = fixture();
        let a = alloc(f.draining, ClientStatus::Running, false);
        assert_eq!(
            TaintedClassifier::default().classify(&a, &f.view),
            AllocClass::Untainted
        );
    }

    #[test]
    fn test_disconnected() {
        let f = fixture();
        let c = TaintedClassifier::default();
        assert_eq!(
            c.classify(&alloc(f.disconnected, ClientStatus::Running, false), &f.view),
            AllocClass::Unknown
        );
        assert_eq!(
            c.classify(&alloc(f.disconnected, ClientStatus::Pending, false), &f.view),
            AllocClass::Unknown
        );
        assert_eq!(
            c.classify(&alloc(f.disconnected, ClientStatus::Unknown, false), &f.view),
            AllocClass::Untainted
        );
    }

    #[test]
    fn test_disconnected_without_tolerance_is_lost() {
        let f = fixture();
        let c = TaintedClassifier::new(ReconcileConfig {
            supports_disconnected_clients: false,
            ..Default::default()
        });
        let a = alloc(f.disconnected, ClientStatus::Running, false);
        assert_eq!(c.classify(&a, &f.view), AllocClass::Lost);
    }

    #[test]
    fn test_reconnect_requires_ready_node() {
        let f = fixture();
        let c = TaintedClassifier::default();
        assert_eq!(
            c.classify(&alloc(f.ready, ClientStatus::Unknown, false), &f.view),
            AllocClass::Reconnectable
        );
        assert_eq!(
            c.classify(&alloc(f.draining, ClientStatus::Unknown, false), &f.view),
            AllocClass::Reconnectable
        );
        assert_eq!(
            c.classify(&alloc(f.initializing, ClientStatus::Unknown, false), &f.view),
            AllocClass::Untainted
        );
        assert_eq!(
            c.classify(&alloc(f.down, ClientStatus::Unknown, false), &f.view),
            AllocClass::Lost
        );
    }

    #[test]
    fn test_partition_class_of() {
        let f = fixture();
        let lost = alloc(f.down, ClientStatus::Running, false);
        let fine = alloc(f.ready, ClientStatus::Running, false);
        let set: AllocSet = vec![lost.clone(), fine.clone()].into_iter().collect();

        let parts = filter_by_tainted_and_unknown(&set, &f.view);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts.class_of(&lost.id), Some(AllocClass::Lost));
        assert_eq!(parts.class_of(&fine.id), Some(AllocClass::Untainted));
        assert_eq!(parts.class_of(&AllocId::new()), None);
        assert_eq!(parts.needs_replacement(), 1);
    }

    #[test]
    fn test_tainted_node_ids() {
        let f = fixture();
        let absent = NodeId::new();
        let set: AllocSet = vec![
            alloc(f.ready, ClientStatus::Running, false),
            alloc(f.down, ClientStatus::Running, false),
            alloc(f.down, ClientStatus::Running, false),
            alloc(f.disconnected, ClientStatus::Running, false),
            alloc(absent, ClientStatus::Running, false),
        ]
        .into_iter()
        .collect();

        let mut expected = vec![f.down, f.disconnected, absent];
        expected.sort();
        assert_eq!(tainted_node_ids(&set, &f.view), expected);
    }

    #[test]
    fn test_tainted_node_ids_includes_draining() {
        let f = fixture();
        let set: AllocSet = vec![alloc(f.draining, ClientStatus::Running, false)]
            .into_iter()
            .collect();
        assert_eq!(tainted_node_ids(&set, &f.view), vec![f.draining]);
    }

    #[test]
    fn test_tainted_node_ids_skips_terminal_allocs() {
        let f = fixture();
        let set: AllocSet = vec![
            alloc(f.down, ClientStatus::Complete, false),
            alloc(f.draining, ClientStatus::Failed, false),
            alloc(NodeId::new(), ClientStatus::Complete, false),
        ]
        .into_iter()
        .collect();
        assert!(tainted_node_ids(&set, &f.view).is_empty());
    }
}
