//! Index bitmaps.
//!
//! A [`Bitmap`] records which slots of a task group are held by live
//! allocations. It is rebuilt from the allocation set on every pass and
//! never persisted. Sizes are whole bytes so the bits can be handed around
//! as a byte vector.

use tracing::trace;

use crate::alloc_set::AllocSet;
use crate::error::{ReconcileError, ReconcileResult};

/// Largest representable bitmap size (a multiple of 8).
pub const MAX_BITMAP_SIZE: u32 = u32::MAX & !7;

/// Fixed-size bit vector over allocation indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    size: u32,
    bytes: Vec<u8>,
}

impl Bitmap {
    /// Create an empty bitmap of `size` bits.
    pub fn new(size: u32) -> ReconcileResult<Self> {
        if size == 0 || size % 8 != 0 {
            return Err(ReconcileError::InvalidBitmapSize(size));
        }
        Ok(Self {
            size,
            bytes: vec![0; (size / 8) as usize],
        })
    }

    /// Build a bitmap sized by [`size_for`] and populated by [`build`].
    pub fn from_allocs(allocs: &AllocSet, minimum_size: u32) -> ReconcileResult<Self> {
        build(allocs, size_for(allocs, minimum_size)?)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn set(&mut self, index: u32) -> ReconcileResult<()> {
        let (byte, mask) = self.locate(index)?;
        self.bytes[byte] |= mask;
        Ok(())
    }

    pub fn unset(&mut self, index: u32) -> ReconcileResult<()> {
        let (byte, mask) = self.locate(index)?;
        self.bytes[byte] &= !mask;
        Ok(())
    }

    /// Clear `index` if it is in range, returning whether it was set.
    /// Indices past the end are already free.
    pub fn release(&mut self, index: u32) -> bool {
        match self.locate(index) {
            Ok((byte, mask)) => {
                let was_set = self.bytes[byte] & mask != 0;
                self.bytes[byte] &= !mask;
                was_set
            }
            Err(_) => false,
        }
    }

    /// Returns true if `index` is set. Indices past the end are never set.
    pub fn is_set(&self, index: u32) -> bool {
        self.locate(index)
            .map(|(byte, mask)| self.bytes[byte] & mask != 0)
            .unwrap_or(false)
    }

    /// Clear every bit.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    pub fn count_set(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    /// Lowest clear bit, or `None` when every bit is set.
    pub fn lowest_free(&self) -> Option<u32> {
        self.bytes
            .iter()
            .position(|b| *b != u8::MAX)
            .map(|byte| byte as u32 * 8 + self.bytes[byte].trailing_ones())
    }

    /// Indices in `[from, to)` whose bit equals `set`, ascending.
    pub fn indexes_in_range(&self, set: bool, from: u32, to: u32) -> Vec<u32> {
        (from..to.min(self.size))
            .filter(|i| self.is_set(*i) == set)
            .collect()
    }

    /// Copy into a larger bitmap. `new_size` must be a valid size no
    /// smaller than the current one.
    pub fn grow(&self, new_size: u32) -> ReconcileResult<Self> {
        if new_size < self.size {
            return Err(ReconcileError::InvalidBitmapSize(new_size));
        }
        let mut grown = Self::new(new_size)?;
        grown.bytes[..self.bytes.len()].copy_from_slice(&self.bytes);
        Ok(grown)
    }

    fn locate(&self, index: u32) -> ReconcileResult<(usize, u8)> {
        if index >= self.size {
            return Err(ReconcileError::IndexOutOfRange {
                index,
                size: self.size,
            });
        }
        Ok(((index / 8) as usize, 1 << (index % 8)))
    }
}

/// Round `bits` up to the next multiple of 8, with a floor of 8.
pub(crate) fn round_up_to_byte(bits: u64) -> Option<u32> {
    let rounded = bits.max(1).div_ceil(8) * 8;
    u32::try_from(rounded).ok().filter(|s| *s <= MAX_BITMAP_SIZE)
}

/// Bitmap size needed for a group: the smallest multiple of 8 that is at
/// least `max(highest index + 1, minimum_size)`.
///
/// Terminal allocations count too, so a size never truncates an index that
/// a record still names. An empty group with `minimum_size == 0` gets 8.
pub fn size_for(allocs: &AllocSet, minimum_size: u32) -> ReconcileResult<u32> {
    let mut highest: Option<u32> = None;
    for alloc in allocs {
        let index = alloc.index()?;
        highest = Some(highest.map_or(index, |h| h.max(index)));
    }

    let needed = highest.map_or(0, |h| u64::from(h) + 1);
    let bits = needed.max(u64::from(minimum_size));

    let size = round_up_to_byte(bits).ok_or_else(|| {
        let index = match highest {
            Some(h) if h >= minimum_size => h,
            _ => minimum_size,
        };
        ReconcileError::IndexOutOfRange {
            index,
            size: MAX_BITMAP_SIZE,
        }
    })?;

    trace!(
        highest_index = ?highest,
        minimum_size,
        size,
        "Computed bitmap size"
    );
    Ok(size)
}

/// Build a bitmap of `size` bits with a bit set for each live allocation.
///
/// Terminal allocations are skipped. A live allocation whose index does
/// not fit is an error rather than being dropped.
pub fn build(allocs: &AllocSet, size: u32) -> ReconcileResult<Bitmap> {
    let mut bitmap = Bitmap::new(size)?;
    for alloc in allocs.iter().filter(|a| !a.is_terminal()) {
        bitmap.set(alloc.index()?)?;
    }
    Ok(bitmap)
}
