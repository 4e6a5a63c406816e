//! Allocation names.
//!
//! Every allocation carries a human-facing name `<job>.<group>[<index>]`.
//! The index is the allocation's slot within its task group and is the
//! only part of the name the reconciler interprets.

use std::fmt;

use thiserror::Error;

/// Why an allocation name could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name does not start with `<job>.<group>[`.
    #[error("expected prefix {expected:?}")]
    MissingPrefix { expected: String },

    /// The name does not end with `]`.
    #[error("missing closing ']'")]
    MissingClosingBracket,

    /// The text between the brackets is not a non-negative integer.
    #[error("invalid index {0:?}")]
    InvalidIndex(String),
}

/// A decoded allocation name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AllocName {
    job_id: String,
    task_group: String,
    index: u32,
}

impl AllocName {
    pub fn new(job_id: impl Into<String>, task_group: impl Into<String>, index: u32) -> Self {
        Self {
            job_id: job_id.into(),
            task_group: task_group.into(),
            index,
        }
    }

    /// Decode `name`, which must belong to `job_id` and `task_group`.
    ///
    /// Job IDs and group names may themselves contain `.` or `[`, so the
    /// prefix is matched literally rather than split on delimiters.
    pub fn parse(name: &str, job_id: &str, task_group: &str) -> Result<Self, NameError> {
        let expected = format!("{job_id}.{task_group}[");
        let rest = name
            .strip_prefix(expected.as_str())
            .ok_or(NameError::MissingPrefix { expected })?;
        let digits = rest
            .strip_suffix(']')
            .ok_or(NameError::MissingClosingBracket)?;

        // u32::from_str accepts a leading '+'
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NameError::InvalidIndex(digits.to_string()));
        }
        let index = digits
            .parse::<u32>()
            .map_err(|_| NameError::InvalidIndex(digits.to_string()))?;

        Ok(Self::new(job_id, task_group, index))
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn task_group(&self) -> &str {
        &self.task_group
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for AllocName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}[{}]", self.job_id, self.task_group, self.index)
    }
}
