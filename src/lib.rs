//! Reader for pre-built k-mer counter databases
//!
//! A database maps every k-mer of a fixed length to the number of times it occurred in
//! the data it was built from. It is stored as two companion files, `<stem>.kmc_pre`
//! (header and prefix table) and `<stem>.kmc_suf` (suffix records with counters), and
//! can be read in one of two modes:
//!
//! * [`RandomAccessReader`]: point lookups of a count by k-mer.
//! * [`ListingReader`]: forward-only enumeration of every entry in storage order.
//!
//! [`KmcFile`] wraps both behind a single handle with an explicit open/close lifecycle.
//! K-mers are exchanged as [`Kmer`] values, which pack two bits per nucleotide.
//!
//! ```no_run
//! use kmc_reader::{Kmer, KmcFile, Result};
//!
//! fn main() -> Result<()> {
//!     let mut db = KmcFile::new();
//!     db.open_for_listing("./data/test1")?;
//!
//!     let mut kmer = Kmer::new();
//!     let mut count = 0;
//!     while db.read_next(&mut kmer, &mut count)? {
//!         println!("{kmer}\t{count}");
//!     }
//!     db.close()
//! }
//! ```

mod error;
mod header;
mod index;
mod kmer;
mod options;
mod reader;

pub use error::{Error, HeaderError, KmerError, OptionsError, ReadError, Result, UsageError};
pub use header::{
    KmcHeader, FORMAT, FORMAT_SIGNATURE_BINNED, PREFIX_MARKER, SIZE_HEADER, SUFFIX_MARKER,
};
pub use kmer::{
    byte_alignment_for, decode_nucleotide, encode_nucleotide, packed_bytes_for, Kmer,
    BITS_PER_NUCLEOTIDE, MAX_KMER_LEN, MAX_U64_KMER_LEN, NUCLEOTIDES_PER_REGISTER, REGISTER_BITS,
};
pub use options::{KmcOptions, DEFAULT_BUFFER_CAPACITY};
pub use reader::{
    AccessMode, DatabasePaths, KmcFile, KmcInfo, ListingReader, RandomAccessReader,
    PREFIX_EXTENSION, SUFFIX_EXTENSION,
};
