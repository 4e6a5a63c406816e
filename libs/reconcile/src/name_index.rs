//! Name index for a single task group.
//!
//! Hands out allocation names for new placements, always picking the
//! lowest free slot so names stay compact and stable across replacement
//! cycles. When the group has more members than bits, the bitmap grows
//! instead of reusing a slot.

use std::collections::BTreeSet;

use tracing::debug;

use crate::alloc_set::AllocSet;
use crate::bitmap::{round_up_to_byte, Bitmap, MAX_BITMAP_SIZE};
use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::name::AllocName;

/// Tracks which indices of a task group are in use.
#[derive(Debug, Clone)]
pub struct AllocNameIndex {
    job_id: String,
    task_group: String,
    count: u32,
    growth: u32,
    bitmap: Bitmap,
}

impl AllocNameIndex {
    /// Seed an index from the allocations currently holding slots.
    ///
    /// Only live allocations belonging to `job_id`/`task_group` are counted;
    /// `count` is the group's desired count and sets the minimum size.
    pub fn new(
        job_id: impl Into<String>,
        task_group: impl Into<String>,
        count: u32,
        in_use: &AllocSet,
    ) -> ReconcileResult<Self> {
        Self::with_config(job_id, task_group, count, in_use, &ReconcileConfig::default())
    }

    pub fn with_config(
        job_id: impl Into<String>,
        task_group: impl Into<String>,
        count: u32,
        in_use: &AllocSet,
        config: &ReconcileConfig,
    ) -> ReconcileResult<Self> {
        config.validate()?;
        let job_id = job_id.into();
        let task_group = task_group.into();

        let members: AllocSet = in_use
            .iter()
            .filter(|a| a.job_id == job_id && a.task_group == task_group)
            .cloned()
            .collect();
        let bitmap = Bitmap::from_allocs(&members, count)?;

        Ok(Self {
            job_id,
            task_group,
            count,
            growth: config.bitmap_growth,
            bitmap,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn is_in_use(&self, index: u32) -> bool {
        self.bitmap.is_set(index)
    }

    /// Mark the indices of the live allocations in `allocs` as used.
    pub fn set(&mut self, allocs: &AllocSet) -> ReconcileResult<()> {
        for alloc in allocs.iter().filter(|a| !a.is_terminal()) {
            let index = alloc.index()?;
            self.ensure_fits(index)?;
            self.bitmap.set(index)?;
        }
        Ok(())
    }

    /// Release the indices of `allocs`.
    pub fn unset(&mut self, allocs: &AllocSet) -> ReconcileResult<()> {
        for alloc in allocs {
            self.unset_index(alloc.index()?);
        }
        Ok(())
    }

    /// Release one index. Indices past the end are already free.
    pub fn unset_index(&mut self, index: u32) {
        self.bitmap.release(index);
    }

    /// Remove and return the names of the `n` highest used indices.
    pub fn highest(&mut self, n: u32) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut i = self.bitmap.size();
        while i > 0 && names.len() < n as usize {
            i -= 1;
            if self.bitmap.release(i) {
                names.insert(self.name(i));
            }
        }
        names
    }

    /// Claim the `n` lowest free indices and return their names.
    pub fn next(&mut self, n: u32) -> ReconcileResult<Vec<String>> {
        let mut names = Vec::with_capacity(n.min(self.bitmap.size()) as usize);
        while names.len() < n as usize {
            let index = match self.bitmap.lowest_free() {
                Some(index) => index,
                None => {
                    self.grow()?;
                    continue;
                }
            };
            self.bitmap.set(index)?;
            names.push(self.name(index));
        }
        Ok(names)
    }

    fn name(&self, index: u32) -> String {
        AllocName::new(self.job_id.as_str(), self.task_group.as_str(), index).to_string()
    }

    fn ensure_fits(&mut self, index: u32) -> ReconcileResult<()> {
        if index < self.bitmap.size() {
            return Ok(());
        }
        let size = round_up_to_byte(u64::from(index) + 1).ok_or(
            ReconcileError::IndexOutOfRange {
                index,
                size: MAX_BITMAP_SIZE,
            },
        )?;
        self.bitmap = self.bitmap.grow(size)?;
        Ok(())
    }

    fn grow(&mut self) -> ReconcileResult<()> {
        let current = self.bitmap.size();
        let size = round_up_to_byte(u64::from(current) + u64::from(self.growth)).ok_or(
            ReconcileError::IndexOutOfRange {
                index: current,
                size: current,
            },
        )?;
        debug!(
            job_id = %self.job_id,
            task_group = %self.task_group,
            from = current,
            to = size,
            "Name index exhausted, growing bitmap"
        );
        self.bitmap = self.bitmap.grow(size)?;
        Ok(())
    }
}
