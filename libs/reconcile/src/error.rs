//! Error types for reconciliation.

use convoy_id::AllocId;
use thiserror::Error;

use crate::name::NameError;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Reconciliation errors.
///
/// The classifier itself never fails; these are raised by index decoding,
/// bitmap bookkeeping, and configuration loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// An allocation's name does not encode a usable index.
    #[error("malformed allocation name {name:?} on {alloc_id}: {reason}")]
    MalformedAllocName {
        alloc_id: AllocId,
        name: String,
        #[source]
        reason: NameError,
    },

    /// Two live allocations in one task group claim the same index.
    #[error("allocations {first} and {second} both hold index {index} in group {task_group:?}")]
    DuplicateIndex {
        task_group: String,
        index: u32,
        first: AllocId,
        second: AllocId,
    },

    /// Bitmap sizes must be positive multiples of 8.
    #[error("invalid bitmap size {0}: must be a positive multiple of 8")]
    InvalidBitmapSize(u32),

    /// Index does not fit in the bitmap.
    #[error("index {index} out of range for bitmap of size {size}")]
    IndexOutOfRange { index: u32, size: u32 },

    /// Configuration value could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReconcileError {
    /// Returns true if the error points at a bad allocation record rather
    /// than at the caller's use of the API.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedAllocName { .. } | Self::DuplicateIndex { .. }
        )
    }
}
