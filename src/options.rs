use crate::{error::OptionsError, KmcHeader, Result};

/// Default capacity of the listing reader's buffer in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 1 << 16;

/// Configuration shared by both reader modes
///
/// Count cutoffs hide entries whose count falls outside `[min_count, max_count]`:
/// listing skips them and lookups report them as absent. Cutoffs may only narrow the
/// range the database was built with.
///
/// ```
/// use kmc_reader::KmcOptions;
///
/// let options = KmcOptions::new().min_count(2).buffer_capacity(1 << 20);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct KmcOptions {
    min_count: Option<u64>,
    max_count: Option<u64>,
    buffer_capacity: Option<usize>,
}
impl KmcOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn min_count(mut self, min_count: u64) -> Self {
        self.min_count = Some(min_count);
        self
    }
    #[must_use]
    pub fn max_count(mut self, max_count: u64) -> Self {
        self.max_count = Some(max_count);
        self
    }
    /// Capacity of the buffer used when listing
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Resolves the cutoffs against the range stored in a database
    pub(crate) fn cutoffs(&self, header: &KmcHeader) -> Result<Cutoffs> {
        let db_min = u64::from(header.min_count);
        let db_max = header.max_count;
        let min = self.min_count.unwrap_or(db_min);
        let max = self.max_count.unwrap_or(db_max);
        if min < db_min || max > db_max || min > max {
            return Err(OptionsError::CutoffOutOfRange {
                min,
                max,
                db_min,
                db_max,
            }
            .into());
        }
        Ok(Cutoffs {
            min,
            max,
            narrowed: min != db_min || max != db_max,
        })
    }

    /// Resolves the listing buffer capacity for records of `record_size` bytes
    pub(crate) fn resolve_buffer_capacity(&self, record_size: usize) -> Result<usize> {
        let capacity = self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY);
        if capacity < record_size {
            return Err(OptionsError::BufferTooSmall(capacity, record_size).into());
        }
        Ok(capacity)
    }
}

/// Effective count range of an open reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cutoffs {
    pub min: u64,
    pub max: u64,
    /// Whether the range is narrower than the database's own
    pub narrowed: bool,
}
impl Cutoffs {
    #[inline]
    pub fn contains(&self, count: u64) -> bool {
        (self.min..=self.max).contains(&count)
    }
}
