//! Random-access reader
//!
//! Memory-maps the suffix file and keeps the prefix table in memory, so a lookup costs
//! one table read and a binary search over the records sharing the key's prefix.

use memmap2::Mmap;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info};

use super::utils::{load_prefix_table, open_regular, prefix_from_bytes, read_counter, DatabasePaths};
use super::KmcInfo;
use crate::{
    error::{KmerError, ReadError, Result},
    header::{KmcHeader, SIZE_MARKER, SUFFIX_MARKER},
    index::PrefixTable,
    options::{Cutoffs, KmcOptions},
    HeaderError, Kmer,
};

/// A memory-mapped reader answering point lookups against a database
///
/// Lookups take `&self`, so one reader can be shared between threads.
///
/// # Examples
///
/// ```no_run
/// use kmc_reader::{Kmer, RandomAccessReader, Result};
///
/// fn main() -> Result<()> {
///     let reader = RandomAccessReader::open("./data/test1")?;
///     let kmer: Kmer = "TAAGA".parse()?;
///     println!("TAAGA occurs {} times", reader.check_kmer(&kmer)?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RandomAccessReader {
    /// Memory mapped suffix file, markers included
    suffixes: Mmap,

    /// Database metadata
    header: KmcHeader,

    /// Record ranges per prefix
    table: PrefixTable,

    /// Effective count range
    cutoffs: Cutoffs,

    /// Number of entries within the cutoffs
    n_entries: u64,
}

impl RandomAccessReader {
    /// Opens a database for random access with default options
    ///
    /// `path` is the database stem, or the path of either companion file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Either file is missing or not a regular file
    /// * The header, markers or prefix table are invalid
    /// * The suffix file size doesn't match the header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, KmcOptions::default())
    }

    /// Opens a database for random access
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: KmcOptions) -> Result<Self> {
        let paths = DatabasePaths::resolve(path);
        let (header, table) = load_prefix_table(&paths.prefix)?;
        let cutoffs = options.cutoffs(&header)?;

        let file = open_regular(&paths.suffix)?;

        // Safety: the database is immutable while open
        let suffixes = unsafe { Mmap::map(&file)? };

        let expected = header.suffix_file_size()?;
        let actual = suffixes.len() as u64;
        if actual != expected {
            return Err(ReadError::FileTruncation(actual, expected).into());
        }
        if &suffixes[..SIZE_MARKER] != SUFFIX_MARKER
            || &suffixes[suffixes.len() - SIZE_MARKER..] != SUFFIX_MARKER
        {
            return Err(HeaderError::InvalidMarker("KMCS").into());
        }

        let mut reader = Self {
            suffixes,
            header,
            table,
            cutoffs,
            n_entries: header.total_kmers,
        };
        if cutoffs.narrowed {
            info!(
                "Counting entries within cutoffs [{}, {}]",
                cutoffs.min, cutoffs.max
            );
            reader.n_entries = reader.count_within_cutoffs();
        }

        debug!(
            "Opened {} for random access: k = {}, {} entries",
            paths.prefix.display(),
            header.kmer_length,
            reader.n_entries
        );
        Ok(reader)
    }

    fn count_within_cutoffs(&self) -> u64 {
        let suffix_bytes = self.header.suffix_bytes();
        (0..self.header.total_kmers)
            .filter(|&idx| {
                self.cutoffs
                    .contains(read_counter(&self.record(idx)[suffix_bytes..]))
            })
            .count() as u64
    }

    /// The raw record (suffix + counter) at `idx`
    #[inline]
    fn record(&self, idx: u64) -> &[u8] {
        let size = self.header.record_size();
        let lbound = SIZE_MARKER + idx as usize * size;
        &self.suffixes[lbound..lbound + size]
    }

    /// Length of the k-mers stored in the database
    #[must_use]
    pub fn kmer_length(&self) -> usize {
        self.header.k()
    }

    /// Number of entries, restricted to the configured cutoffs
    #[must_use]
    pub fn kmer_count(&self) -> u64 {
        self.n_entries
    }

    /// Returns a copy of the database header
    #[must_use]
    pub fn header(&self) -> KmcHeader {
        self.header
    }

    /// Summary of the database and the effective cutoffs
    #[must_use]
    pub fn info(&self) -> KmcInfo {
        KmcInfo::new(&self.header, &self.cutoffs)
    }

    /// Looks up the count of a k-mer
    ///
    /// Returns 0 when the k-mer is absent or its count lies outside the cutoffs. The
    /// k-mer is looked up as given; callers of a both-strands database should pass
    /// [`Kmer::canonical`] when they start from an arbitrary strand.
    ///
    /// # Errors
    ///
    /// Returns [`KmerError::KmerLengthMismatch`] if the k-mer length differs from the
    /// database.
    pub fn check_kmer(&self, kmer: &Kmer) -> Result<u64> {
        if kmer.len() != self.header.k() {
            return Err(KmerError::KmerLengthMismatch {
                expected: self.header.k(),
                got: kmer.len(),
            }
            .into());
        }

        let key = kmer.to_bytes();
        let (prefix, suffix) = key.split_at(self.header.prefix_bytes());
        let range = self.table.range(prefix_from_bytes(prefix));

        let suffix_bytes = self.header.suffix_bytes();
        let (mut lo, mut hi) = (range.start, range.end);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let record = self.record(mid);
            match record[..suffix_bytes].cmp(suffix) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => {
                    let count = read_counter(&record[suffix_bytes..]);
                    return Ok(if self.cutoffs.contains(count) { count } else { 0 });
                }
            }
        }
        Ok(0)
    }

    /// Counts of every k-mer window of a read, in order
    ///
    /// Windows are canonicalised first when the database stores both strands. A window
    /// containing a symbol outside of `ACGT` yields 0. Reads shorter than k yield no
    /// counts.
    pub fn counts_for_read<S: AsRef<[u8]>>(&self, read: S) -> Result<Vec<u64>> {
        let read = read.as_ref();
        let k = self.header.k();
        if read.len() < k {
            return Ok(Vec::new());
        }

        let mut kmer = Kmer::with_len(k);
        let mut counts = Vec::with_capacity(read.len() - k + 1);
        for window in read.windows(k) {
            if kmer.set_sequence(window).is_err() {
                counts.push(0);
                continue;
            }
            let count = if self.header.both_strands {
                self.check_kmer(&kmer.canonical())?
            } else {
                self.check_kmer(&kmer)?
            };
            counts.push(count);
        }
        Ok(counts)
    }

    /// Releases the memory maps
    pub fn close(self) {
        debug!("Closing random-access reader");
    }
}
