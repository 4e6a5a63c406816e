//! ID types for the records the reconciler reads.

use crate::define_id;

define_id!(
    /// Identity of one allocation (one placed instance of a task group).
    AllocId,
    "alloc"
);

define_id!(
    /// Identity of a client node.
    NodeId,
    "node"
);
