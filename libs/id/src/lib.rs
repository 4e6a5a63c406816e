//! # convoy-id
//!
//! Typed identifiers for the records the reconciler reads.
//!
//! Allocations and nodes are referenced by opaque IDs of the form
//! `{prefix}_{ulid}`:
//!
//! - `alloc_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `node_01HV4Z3MXNKPQR9HSTZ7WCLD4E`
//!
//! The prefix keeps an allocation ID from being passed where a node ID is
//! expected, both at compile time (distinct types) and at parse time
//! (prefix check). The ULID part gives a total order, so collections keyed
//! by these IDs iterate deterministically.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that construct IDs from raw ULIDs.
pub use ulid::Ulid;
