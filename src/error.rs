/// Custom Result type for kmc-reader operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the kmc-reader library, encompassing all possible error cases
/// that can occur while decoding k-mers or reading a database.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors related to the database metadata and file markers
    HeaderError(#[from] HeaderError),
    /// Errors that occur while reading database files
    ReadError(#[from] ReadError),
    /// Errors from the k-mer codec
    KmerError(#[from] KmerError),
    /// Violations of the reader's open/close protocol
    UsageError(#[from] UsageError),
    /// Invalid reader configuration
    OptionsError(#[from] OptionsError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
}
impl Error {
    /// Checks if the error reports a violated open/close protocol rather than bad data
    ///
    /// These indicate a programming error in the caller and are not worth retrying.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UsageError(_))
    }
}

/// Errors specific to processing and validating the database metadata
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// A file does not start or end with its expected marker
    ///
    /// # Arguments
    /// * `&str` - The marker that was expected
    #[error("Missing file marker: expected {0:?}")]
    InvalidMarker(&'static str),

    /// The format version in the header is not supported
    #[error("Unsupported database version: {0:#x}")]
    UnsupportedVersion(u32),

    /// The counter mode in the header is not supported
    #[error("Unsupported counter mode: {0}")]
    UnsupportedMode(u32),

    /// The header offset stored at the end of the prefix file is unexpected
    #[error("Invalid header offset: {0}. Expected: {1}")]
    InvalidHeaderOffset(u32, u32),

    /// The k-mer length in the header is outside the supported range
    #[error("Invalid k-mer length: {0}")]
    InvalidKmerLength(u32),

    /// The prefix length cannot split the k-mer into whole suffix bytes
    #[error("Invalid prefix length {prefix} for k-mer length {k}")]
    InvalidPrefixLength { prefix: u32, k: u32 },

    /// The counter width is outside the supported range
    #[error("Invalid counter size: {0} - expecting [1,8]")]
    InvalidCounterSize(u32),

    /// The size of a section does not match what was specified in the header
    ///
    /// # Arguments
    /// * First `usize` - The actual number of bytes provided
    /// * Second `usize` - The expected number of bytes according to the header
    #[error("Invalid number of bytes provided: {0}. Expected: {1}")]
    InvalidSize(usize, usize),

    /// The entry count in the header cannot describe a suffix file on this platform
    #[error("Header claims {0} k-mers, more than a suffix file can address")]
    TooManyKmers(u64),

    /// The prefix table is not a cumulative index into the suffix records
    #[error("Prefix table is corrupt at entry {0}")]
    CorruptPrefixTable(usize),
}

/// Errors that can occur while reading database files
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file being read is not a regular file (e.g., it might be a directory or special file)
    #[error("File is not regular: {0}")]
    IncompatibleFile(String),

    /// One of the two companion files could not be found
    #[error("Missing database file: {0}")]
    MissingFile(String),

    /// The file appears to be truncated or corrupted
    ///
    /// # Arguments
    /// * First `u64` - The actual size of the file in bytes
    /// * Second `u64` - The size expected from the header
    #[error("Suffix file holds {0} bytes but the header implies {1} - possibly truncated")]
    FileTruncation(u64, u64),
}

/// Errors from building or converting k-mers
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KmerError {
    /// The sequence contains a symbol outside of `ACGT`
    #[error("Invalid nucleotide {symbol:?} at position {pos}")]
    InvalidNucleotide { symbol: char, pos: usize },

    /// The sequence is longer than the k-mer's capacity
    #[error("Sequence length ({got}) exceeds k-mer capacity ({capacity})")]
    ExceedsCapacity { capacity: usize, got: usize },

    /// The k-mer is too long to be viewed as a single 64-bit integer
    #[error("K-mer length ({0}) exceeds the 32 nucleotides of a 64-bit view")]
    TooLongForU64(usize),

    /// The packed byte form does not match the requested length
    #[error("Packed k-mer of length {len} requires {expected} bytes, got {got}")]
    PackedSize {
        len: usize,
        expected: usize,
        got: usize,
    },

    /// The k-mer length does not match the database
    #[error("K-mer length ({got}) does not match the database ({expected})")]
    KmerLengthMismatch { expected: usize, got: usize },
}

/// Violations of the reader state machine
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    /// An operation other than open was attempted on a closed reader
    #[error("Database is not open")]
    NotOpen,

    /// Open was attempted on a reader that is already open
    #[error("Database is already open - close it first")]
    AlreadyOpen,

    /// The operation belongs to the other access mode
    #[error("Operation `{op}` requires {required} mode")]
    WrongMode {
        op: &'static str,
        required: crate::AccessMode,
    },
}

/// Errors in the reader configuration
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsError {
    /// A cutoff would widen the range of counts stored in the database
    #[error(
        "Count cutoffs [{min}, {max}] must lie within the database range [{db_min}, {db_max}]"
    )]
    CutoffOutOfRange {
        min: u64,
        max: u64,
        db_min: u64,
        db_max: u64,
    },

    /// The listing buffer cannot hold a single record
    #[error("Buffer capacity ({0}) is smaller than one record ({1})")]
    BufferTooSmall(usize, usize),
}
