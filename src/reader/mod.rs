mod file;
mod listing;
mod random_access;
mod utils;

use std::fmt;

pub use file::KmcFile;
pub use listing::ListingReader;
pub use random_access::RandomAccessReader;
pub use utils::{DatabasePaths, PREFIX_EXTENSION, SUFFIX_EXTENSION};

use crate::{options::Cutoffs, KmcHeader};

/// The two mutually exclusive ways of reading a database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Point lookups of a count by k-mer
    RandomAccess,
    /// Ordered, forward-only enumeration of every entry
    SequentialListing,
}
impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomAccess => f.write_str("random-access"),
            Self::SequentialListing => f.write_str("sequential-listing"),
        }
    }
}

/// Summary of an open database
///
/// `min_count` and `max_count` are the effective cutoffs, which may be narrower than
/// the range stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmcInfo {
    pub kmer_length: u32,
    pub mode: u32,
    pub counter_size: u32,
    pub lut_prefix_length: u32,
    pub min_count: u64,
    pub max_count: u64,
    pub both_strands: bool,
    /// Number of stored entries, regardless of the cutoffs
    pub total_kmers: u64,
}
impl KmcInfo {
    pub(crate) fn new(header: &KmcHeader, cutoffs: &Cutoffs) -> Self {
        Self {
            kmer_length: header.kmer_length,
            mode: header.mode,
            counter_size: header.counter_size,
            lut_prefix_length: header.lut_prefix_length,
            min_count: cutoffs.min,
            max_count: cutoffs.max,
            both_strands: header.both_strands,
            total_kmers: header.total_kmers,
        }
    }
}
