//! Listing reader
//!
//! Streams the suffix file front to back through a buffered reader while walking the
//! prefix table alongside it, so each step reads one record and advances the current
//! prefix only when the record index crosses into the next prefix's range.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, trace};

use super::utils::{load_prefix_table, open_regular, push_prefix_bytes, read_counter, DatabasePaths};
use super::KmcInfo;
use crate::{
    error::{KmerError, ReadError, Result},
    header::{KmcHeader, SIZE_MARKER, SUFFIX_MARKER},
    index::PrefixTable,
    options::{Cutoffs, KmcOptions},
    HeaderError, Kmer,
};

/// A forward-only reader over every (k-mer, count) entry of a database
///
/// Entries come out in storage order, which is ascending by k-mer. The cursor can be
/// rewound with [`ListingReader::restart_listing`] without reopening the files.
///
/// # Examples
///
/// ```no_run
/// use kmc_reader::{Kmer, ListingReader, Result};
///
/// fn main() -> Result<()> {
///     let mut reader = ListingReader::open("./data/test1")?;
///     let mut kmer = Kmer::new();
///     let mut count = 0;
///     while reader.read_next(&mut kmer, &mut count)? {
///         println!("{kmer}\t{count}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct ListingReader {
    /// Buffered suffix file
    inner: BufReader<File>,

    /// Database metadata
    header: KmcHeader,

    /// Record ranges per prefix
    table: PrefixTable,

    /// Effective count range
    cutoffs: Cutoffs,

    /// Number of entries within the cutoffs
    n_entries: u64,

    /// Reusable buffer for one record
    record: Vec<u8>,

    /// Reusable buffer for the packed key (prefix bytes + suffix bytes)
    key: Vec<u8>,

    /// Prefix of the next record
    prefix: usize,

    /// Index of the next record in the suffix file
    position: u64,

    /// Number of entries returned since the last restart
    n_processed: u64,

    /// Whether the end of the records was reached
    finished: bool,
}

impl ListingReader {
    /// Opens a database for listing with default options
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

    /// Opens a database for listing
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: KmcOptions) -> Result<Self> {
        let paths = DatabasePaths::resolve(path);
        let (header, table) = load_prefix_table(&paths.prefix)?;
        let cutoffs = options.cutoffs(&header)?;
        let capacity = options.resolve_buffer_capacity(header.record_size())?;

        let mut file = open_regular(&paths.suffix)?;
        let expected = header.suffix_file_size()?;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(ReadError::FileTruncation(actual, expected).into());
        }
        check_suffix_markers(&mut file, expected)?;

        let mut reader = Self {
            inner: BufReader::with_capacity(capacity, file),
            header,
            table,
            cutoffs,
            n_entries: header.total_kmers,
            record: vec![0; header.record_size()],
            key: Vec::with_capacity(header.prefix_bytes() + header.suffix_bytes()),
            prefix: 0,
            position: 0,
            n_processed: 0,
            finished: false,
        };
        if cutoffs.narrowed {
            info!(
                "Counting entries within cutoffs [{}, {}]",
                cutoffs.min, cutoffs.max
            );
            reader.n_entries = reader.count_within_cutoffs()?;
        }
        reader.restart_listing()?;

        debug!(
            "Opened {} for listing: k = {}, {} entries",
            paths.prefix.display(),
            header.kmer_length,
            reader.n_entries
        );
        Ok(reader)
    }

    /// One pass over the counters, leaving the cursor at the end
    fn count_within_cutoffs(&mut self) -> Result<u64> {
        let suffix_bytes = self.header.suffix_bytes();
        let mut n_entries = 0;
        for _ in 0..self.header.total_kmers {
            self.inner.read_exact(&mut self.record)?;
            if self.cutoffs.contains(read_counter(&self.record[suffix_bytes..])) {
                n_entries += 1;
            }
        }
        Ok(n_entries)
    }

    /// Length of the k-mers stored in the database
    #[must_use]
    pub fn kmer_length(&self) -> usize {
        self.header.k()
    }

    /// Number of entries a full pass yields
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

    /// Number of entries returned since the last restart
    #[must_use]
    pub fn n_processed(&self) -> u64 {
        self.n_processed
    }

    /// Whether the cursor has passed the last entry
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reads the next entry into `kmer` and `count`
    ///
    /// Returns `Ok(false)` once every entry has been read, and keeps returning it until
    /// the listing is restarted. `kmer` is resized to the database's k-mer length. After
    /// a read error the listing is finished until restarted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * `kmer` cannot hold k nucleotides (the cursor is not advanced)
    /// * Reading the suffix file fails
    pub fn read_next(&mut self, kmer: &mut Kmer, count: &mut u64) -> Result<bool> {
        let k = self.header.k();
        if kmer.capacity() < k {
            return Err(KmerError::ExceedsCapacity {
                capacity: kmer.capacity(),
                got: k,
            }
            .into());
        }

        if self.finished {
            return Ok(false);
        }

        let suffix_bytes = self.header.suffix_bytes();
        while self.position < self.header.total_kmers {
            // a partial read leaves the buffer misaligned with `position`
            if let Err(e) = self.inner.read_exact(&mut self.record) {
                self.finished = true;
                return Err(e.into());
            }
            let idx = self.position;
            self.position += 1;
            while self.table.end_of(self.prefix) <= idx {
                self.prefix += 1;
            }
            debug_assert!(self.prefix < self.table.n_prefixes());

            let value = read_counter(&self.record[suffix_bytes..]);
            if !self.cutoffs.contains(value) {
                continue;
            }

            self.key.clear();
            push_prefix_bytes(&mut self.key, self.prefix, self.header.prefix_bytes());
            self.key.extend_from_slice(&self.record[..suffix_bytes]);
            kmer.set_packed_bytes(k, &self.key)?;
            *count = value;
            self.n_processed += 1;
            return Ok(true);
        }

        self.finished = true;
        Ok(false)
    }

    /// Rewinds the cursor to the first entry
    pub fn restart_listing(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(SIZE_MARKER as u64))?;
        self.prefix = 0;
        self.position = 0;
        self.n_processed = 0;
        self.finished = false;
        trace!("Listing restarted");
        Ok(())
    }

    /// Releases the file handles
    pub fn close(self) {
        debug!("Closing listing reader after {} entries", self.n_processed);
    }
}

impl Iterator for ListingReader {
    type Item = Result<(Kmer, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut kmer = Kmer::with_len(self.header.k());
        let mut count = 0;
        match self.read_next(&mut kmer, &mut count) {
            Ok(true) => Some(Ok((kmer, count))),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Verifies the `KMCS` markers at both ends of the suffix file
fn check_suffix_markers(file: &mut File, size: u64) -> Result<()> {
    let mut marker = [0u8; SIZE_MARKER];
    file.read_exact(&mut marker)?;
    if &marker != SUFFIX_MARKER {
        return Err(HeaderError::InvalidMarker("KMCS").into());
    }
    file.seek(SeekFrom::Start(size - SIZE_MARKER as u64))?;
    file.read_exact(&mut marker)?;
    if &marker != SUFFIX_MARKER {
        return Err(HeaderError::InvalidMarker("KMCS").into());
    }
    file.seek(SeekFrom::Start(SIZE_MARKER as u64))?;
    Ok(())
}
