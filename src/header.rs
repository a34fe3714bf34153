//! Header module for the kmc-reader library
//!
//! The database metadata is a fixed 64-byte block stored near the end of the prefix
//! file. It records the k-mer length, how each k-mer is split into a prefix (indexed by
//! the prefix table) and a suffix (stored in the suffix file), the counter width and the
//! number of stored k-mers.
//!
//! ```text
//! <stem>.kmc_pre:  "KMCP" | prefix table (4^p x u64) | header (64) | header offset (u32) | "KMCP"
//! <stem>.kmc_suf:  "KMCS" | records (suffix bytes + counter bytes) ... | "KMCS"
//! ```

use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;

use crate::{
    error::{HeaderError, Result},
    kmer::MAX_KMER_LEN,
};

/// Marker at both ends of the prefix file
pub const PREFIX_MARKER: &[u8; 4] = b"KMCP";

/// Marker at both ends of the suffix file
pub const SUFFIX_MARKER: &[u8; 4] = b"KMCS";

/// Size of a file marker in bytes
pub const SIZE_MARKER: usize = 4;

/// Size of the header in bytes
pub const SIZE_HEADER: usize = 64;

/// Size of the trailing header offset field in bytes
pub const SIZE_HEADER_OFFSET: usize = 4;

/// Supported format version (prefix table layout)
pub const FORMAT: u32 = 0;

/// Format version of the signature-binned layout, which this reader does not support
pub const FORMAT_SIGNATURE_BINNED: u32 = 0x200;

/// Counter mode for plain integer counters
pub const MODE_INTEGER: u32 = 0;

/// Longest supported prefix; the prefix table holds `4^p` entries
pub const MAX_PREFIX_LEN: u32 = 16;

/// Widest supported counter in bytes
pub const MAX_COUNTER_SIZE: u32 = 8;

/// Database metadata
///
/// The header is 64 bytes, all integers little-endian:
///
/// | offset | field |
/// |---|---|
/// | 0 | `kmer_length: u32` |
/// | 4 | `mode: u32` |
/// | 8 | `counter_size: u32` |
/// | 12 | `lut_prefix_length: u32` |
/// | 16 | `min_count: u32` |
/// | 20 | `max_count` low half: `u32` |
/// | 24 | `total_kmers: u64` |
/// | 32 | single strand flag: `u8` (0 = both strands) |
/// | 36 | `max_count` high half: `u32` |
/// | 60 | `version: u32` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmcHeader {
    /// Length of every k-mer in the database
    pub kmer_length: u32,

    /// Counter mode (only integer counters are supported)
    pub mode: u32,

    /// Width of each stored counter in bytes
    pub counter_size: u32,

    /// Number of leading nucleotides resolved through the prefix table
    pub lut_prefix_length: u32,

    /// Smallest count kept when the database was built
    pub min_count: u32,

    /// Largest count kept when the database was built
    pub max_count: u64,

    /// Number of stored k-mers
    pub total_kmers: u64,

    /// Whether k-mers were canonicalised over both strands
    pub both_strands: bool,

    /// Format version
    pub version: u32,
}
impl KmcHeader {
    /// Creates a header for an integer-counter database
    ///
    /// The count range defaults to `[1, u32::MAX]` and both strands.
    #[must_use]
    pub fn new(kmer_length: u32, lut_prefix_length: u32, counter_size: u32, total_kmers: u64) -> Self {
        Self {
            kmer_length,
            mode: MODE_INTEGER,
            counter_size,
            lut_prefix_length,
            min_count: 1,
            max_count: u64::from(u32::MAX),
            total_kmers,
            both_strands: true,
            version: FORMAT,
        }
    }

    /// Parses a header from a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The version is not [`FORMAT`]
    /// * The counter mode is not [`MODE_INTEGER`]
    /// * The k-mer length, prefix length or counter size is out of range
    pub fn from_bytes(buffer: &[u8; SIZE_HEADER]) -> Result<Self> {
        let version = LittleEndian::read_u32(&buffer[60..64]);
        if version != FORMAT {
            return Err(HeaderError::UnsupportedVersion(version).into());
        }
        let mode = LittleEndian::read_u32(&buffer[4..8]);
        if mode != MODE_INTEGER {
            return Err(HeaderError::UnsupportedMode(mode).into());
        }
        let max_lo = LittleEndian::read_u32(&buffer[20..24]);
        let max_hi = LittleEndian::read_u32(&buffer[36..40]);
        let header = Self {
            kmer_length: LittleEndian::read_u32(&buffer[0..4]),
            mode,
            counter_size: LittleEndian::read_u32(&buffer[8..12]),
            lut_prefix_length: LittleEndian::read_u32(&buffer[12..16]),
            min_count: LittleEndian::read_u32(&buffer[16..20]),
            max_count: (u64::from(max_hi) << 32) | u64::from(max_lo),
            total_kmers: LittleEndian::read_u64(&buffer[24..32]),
            both_strands: buffer[32] == 0,
            version,
        };
        header.validate()?;
        Ok(header)
    }

    /// Parses a header from the start of an arbitrarily sized buffer
    pub fn from_buffer(buffer: &[u8]) -> Result<Self> {
        let mut bytes = [0u8; SIZE_HEADER];
        if buffer.len() < SIZE_HEADER {
            return Err(HeaderError::InvalidSize(buffer.len(), SIZE_HEADER).into());
        }
        bytes.copy_from_slice(&buffer[..SIZE_HEADER]);
        Self::from_bytes(&bytes)
    }

    /// Writes the header to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffer = [0u8; SIZE_HEADER];
        LittleEndian::write_u32(&mut buffer[0..4], self.kmer_length);
        LittleEndian::write_u32(&mut buffer[4..8], self.mode);
        LittleEndian::write_u32(&mut buffer[8..12], self.counter_size);
        LittleEndian::write_u32(&mut buffer[12..16], self.lut_prefix_length);
        LittleEndian::write_u32(&mut buffer[16..20], self.min_count);
        LittleEndian::write_u32(&mut buffer[20..24], self.max_count as u32);
        LittleEndian::write_u64(&mut buffer[24..32], self.total_kmers);
        buffer[32] = u8::from(!self.both_strands);
        LittleEndian::write_u32(&mut buffer[36..40], (self.max_count >> 32) as u32);
        LittleEndian::write_u32(&mut buffer[60..64], self.version);
        writer.write_all(&buffer)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let k = self.kmer_length;
        if k == 0 || k as usize > MAX_KMER_LEN {
            return Err(HeaderError::InvalidKmerLength(k).into());
        }
        let prefix = self.lut_prefix_length;
        if prefix > MAX_PREFIX_LEN || prefix > k || (k - prefix) % 4 != 0 {
            return Err(HeaderError::InvalidPrefixLength { prefix, k }.into());
        }
        if self.counter_size == 0 || self.counter_size > MAX_COUNTER_SIZE {
            return Err(HeaderError::InvalidCounterSize(self.counter_size).into());
        }
        Ok(())
    }

    /// Length of every k-mer in nucleotides
    #[must_use]
    pub fn k(&self) -> usize {
        self.kmer_length as usize
    }

    /// Number of entries in the prefix table (`4^p`)
    #[must_use]
    pub fn prefix_entries(&self) -> usize {
        1 << (2 * self.lut_prefix_length)
    }

    /// Number of leading packed bytes taken by the prefix (padding included)
    #[must_use]
    pub fn prefix_bytes(&self) -> usize {
        self.lut_prefix_length.div_ceil(4) as usize
    }

    /// Number of packed bytes stored per suffix
    #[must_use]
    pub fn suffix_bytes(&self) -> usize {
        ((self.kmer_length - self.lut_prefix_length) / 4) as usize
    }

    /// Size of one suffix record (suffix + counter) in bytes
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.suffix_bytes() + self.counter_size as usize
    }

    /// Expected size of the prefix file in bytes
    #[must_use]
    pub fn prefix_file_size(&self) -> usize {
        2 * SIZE_MARKER + 8 * self.prefix_entries() + SIZE_HEADER + SIZE_HEADER_OFFSET
    }

    /// Expected size of the suffix file in bytes
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::TooManyKmers`] if the size overflows or cannot be mapped
    /// into memory on this platform.
    pub fn suffix_file_size(&self) -> Result<u64> {
        self.total_kmers
            .checked_mul(self.record_size() as u64)
            .and_then(|records| records.checked_add(2 * SIZE_MARKER as u64))
            .filter(|&size| usize::try_from(size).is_ok())
            .ok_or_else(|| HeaderError::TooManyKmers(self.total_kmers).into())
    }
}
