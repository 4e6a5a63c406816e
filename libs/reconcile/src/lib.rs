//! Reconciliation core for task-group allocations.
//!
//! Given a snapshot of a job's allocations and the nodes they reference,
//! this crate answers two questions for the outer reconciliation driver:
//!
//! - **Which allocations need corrective action?** The classifier splits
//!   an [`AllocSet`] into untainted, migrate, lost, unknown, and
//!   reconnectable partitions.
//! - **Which slot does the next allocation get?** The [`Bitmap`] and
//!   [`AllocNameIndex`] track occupied indices per task group and hand
//!   out the lowest free one.
//!
//! # Invariants
//!
//! - Classification is total: every allocation lands in exactly one
//!   partition, and classification never fails
//! - Results are deterministic given the same snapshots
//! - No two live allocations in a task group are ever handed the same index
//! - Malformed allocation names are reported, never read as index 0

pub mod alloc_set;
pub mod bitmap;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod name;
pub mod name_index;
pub mod node_view;

pub use alloc_set::AllocSet;
pub use bitmap::{build, size_for, Bitmap};
pub use classify::{
    filter_by_tainted_and_unknown, tainted_node_ids, AllocClass, TaintedClassifier,
    TaintedPartition,
};
pub use config::ReconcileConfig;
pub use error::{ReconcileError, ReconcileResult};
pub use model::{
    Allocation, ClientStatus, DesiredStatus, DesiredTransition, DrainStrategy, Node, NodeStatus,
};
pub use name::{AllocName, NameError};
pub use name_index::AllocNameIndex;
pub use node_view::{NodeLookup, NodeView};

pub use convoy_id::{AllocId, NodeId};
