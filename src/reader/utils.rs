use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::{
    error::{ReadError, Result},
    index::PrefixTable,
    KmcHeader,
};

/// Extension of the prefix file
pub const PREFIX_EXTENSION: &str = "kmc_pre";

/// Extension of the suffix file
pub const SUFFIX_EXTENSION: &str = "kmc_suf";

/// Locations of the two companion files of a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePaths {
    pub prefix: PathBuf,
    pub suffix: PathBuf,
}
impl DatabasePaths {
    /// Resolves a database stem, or the path of either companion file, into both paths
    pub fn resolve<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let stem = match path.extension().and_then(|e| e.to_str()) {
            Some(PREFIX_EXTENSION | SUFFIX_EXTENSION) => path.with_extension(""),
            _ => path.to_path_buf(),
        };
        Self {
            prefix: append_extension(&stem, PREFIX_EXTENSION),
            suffix: append_extension(&stem, SUFFIX_EXTENSION),
        }
    }
}

/// Appends an extension without replacing one already present (`db.v2` -> `db.v2.kmc_pre`)
fn append_extension(stem: &Path, extension: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Opens a file, verifying that it exists and is a regular file
pub(crate) fn open_regular(path: &Path) -> Result<File> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ReadError::MissingFile(path.display().to_string()).into(),
        _ => crate::Error::from(e),
    })?;
    if !file.metadata()?.is_file() {
        return Err(ReadError::IncompatibleFile(path.display().to_string()).into());
    }
    Ok(file)
}

/// Loads and validates the prefix file of a database
pub(crate) fn load_prefix_table(path: &Path) -> Result<(KmcHeader, PrefixTable)> {
    let file = open_regular(path)?;

    // Safety: the database is immutable while open and the map is dropped before returning
    let mmap = unsafe { Mmap::map(&file)? };
    PrefixTable::parse(&mmap)
}

/// Decodes a little-endian counter of 1 to 8 bytes
#[inline]
pub(crate) fn read_counter(bytes: &[u8]) -> u64 {
    LittleEndian::read_uint(bytes, bytes.len())
}

/// Packs the prefix value into its big-endian byte form
#[inline]
pub(crate) fn push_prefix_bytes(buf: &mut Vec<u8>, prefix: usize, n_bytes: usize) {
    buf.extend((0..n_bytes).rev().map(|i| (prefix >> (8 * i)) as u8));
}

/// Reads the prefix value back from its big-endian byte form
#[inline]
pub(crate) fn prefix_from_bytes(bytes: &[u8]) -> usize {
    bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
}
