use std::path::Path;
use tracing::debug;

use super::{AccessMode, KmcInfo, ListingReader, RandomAccessReader};
use crate::{error::UsageError, Kmer, KmcOptions, Result};

#[derive(Debug, Default)]
enum State {
    #[default]
    Closed,
    RandomAccess(RandomAccessReader),
    Listing(ListingReader),
}

/// A database handle that is either closed or open in exactly one [`AccessMode`]
///
/// This is the single-object view of the two readers: every operation checks the
/// handle's state and reports a [`UsageError`] when called on a closed handle or in the
/// wrong mode. Code that knows its mode up front can use [`RandomAccessReader`] or
/// [`ListingReader`] directly, where those errors cannot occur.
///
/// ```text
/// Closed --open_for_random_access--> Open(RandomAccess) --close--> Closed
/// Closed --open_for_listing--------> Open(SequentialListing) --close--> Closed
/// ```
///
/// # Examples
///
/// ```no_run
/// use kmc_reader::{KmcFile, Kmer, Result};
///
/// fn main() -> Result<()> {
///     let mut file = KmcFile::new();
///     file.open_for_random_access("./data/test1")?;
///     assert_eq!(file.kmer_length()?, 5);
///
///     let kmer: Kmer = "TAAGA".parse()?;
///     let count = file.check_kmer(&kmer)?;
///     file.close()?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct KmcFile {
    state: State,
}

impl KmcFile {
    /// Creates a closed handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_closed(&self) -> Result<()> {
        match self.state {
            State::Closed => Ok(()),
            _ => Err(UsageError::AlreadyOpen.into()),
        }
    }

    /// Opens a database for random access
    ///
    /// On error the handle stays closed.
    pub fn open_for_random_access<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.open_for_random_access_with_options(path, KmcOptions::default())
    }

    pub fn open_for_random_access_with_options<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: KmcOptions,
    ) -> Result<()> {
        self.ensure_closed()?;
        let reader = RandomAccessReader::open_with_options(path, options)?;
        self.state = State::RandomAccess(reader);
        Ok(())
    }

    /// Opens a database for sequential listing, with the cursor on the first entry
    ///
    /// On error the handle stays closed.
    pub fn open_for_listing<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.open_for_listing_with_options(path, KmcOptions::default())
    }

    pub fn open_for_listing_with_options<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: KmcOptions,
    ) -> Result<()> {
        self.ensure_closed()?;
        let reader = ListingReader::open_with_options(path, options)?;
        self.state = State::Listing(reader);
        Ok(())
    }

    /// The mode the handle is open in, or `None` when closed
    #[must_use]
    pub fn mode(&self) -> Option<AccessMode> {
        match self.state {
            State::Closed => None,
            State::RandomAccess(_) => Some(AccessMode::RandomAccess),
            State::Listing(_) => Some(AccessMode::SequentialListing),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.mode().is_some()
    }

    /// Length of the k-mers stored in the database
    pub fn kmer_length(&self) -> Result<usize> {
        match &self.state {
            State::Closed => Err(UsageError::NotOpen.into()),
            State::RandomAccess(reader) => Ok(reader.kmer_length()),
            State::Listing(reader) => Ok(reader.kmer_length()),
        }
    }

    /// Number of entries, restricted to the configured cutoffs
    pub fn kmer_count(&self) -> Result<u64> {
        match &self.state {
            State::Closed => Err(UsageError::NotOpen.into()),
            State::RandomAccess(reader) => Ok(reader.kmer_count()),
            State::Listing(reader) => Ok(reader.kmer_count()),
        }
    }

    /// Summary of the open database
    pub fn info(&self) -> Result<KmcInfo> {
        match &self.state {
            State::Closed => Err(UsageError::NotOpen.into()),
            State::RandomAccess(reader) => Ok(reader.info()),
            State::Listing(reader) => Ok(reader.info()),
        }
    }

    fn listing(&mut self, op: &'static str) -> Result<&mut ListingReader> {
        match &mut self.state {
            State::Listing(reader) => Ok(reader),
            State::Closed => Err(UsageError::NotOpen.into()),
            State::RandomAccess(_) => Err(UsageError::WrongMode {
                op,
                required: AccessMode::SequentialListing,
            }
            .into()),
        }
    }

    fn random_access(&self, op: &'static str) -> Result<&RandomAccessReader> {
        match &self.state {
            State::RandomAccess(reader) => Ok(reader),
            State::Closed => Err(UsageError::NotOpen.into()),
            State::Listing(_) => Err(UsageError::WrongMode {
                op,
                required: AccessMode::RandomAccess,
            }
            .into()),
        }
    }

    /// Reads the next entry; see [`ListingReader::read_next`]
    pub fn read_next(&mut self, kmer: &mut Kmer, count: &mut u64) -> Result<bool> {
        self.listing("read_next")?.read_next(kmer, count)
    }

    /// Rewinds the listing cursor; see [`ListingReader::restart_listing`]
    pub fn restart_listing(&mut self) -> Result<()> {
        self.listing("restart_listing")?.restart_listing()
    }

    /// Looks up the count of a k-mer; see [`RandomAccessReader::check_kmer`]
    pub fn check_kmer(&self, kmer: &Kmer) -> Result<u64> {
        self.random_access("check_kmer")?.check_kmer(kmer)
    }

    /// Counts of every k-mer window of a read; see [`RandomAccessReader::counts_for_read`]
    pub fn counts_for_read<S: AsRef<[u8]>>(&self, read: S) -> Result<Vec<u64>> {
        self.random_access("counts_for_read")?.counts_for_read(read)
    }

    /// Releases the database; the handle can be opened again afterwards
    pub fn close(&mut self) -> Result<()> {
        match std::mem::take(&mut self.state) {
            State::Closed => Err(UsageError::NotOpen.into()),
            State::RandomAccess(reader) => {
                reader.close();
                Ok(())
            }
            State::Listing(reader) => {
                reader.close();
                Ok(())
            }
        }
    }
}

impl From<RandomAccessReader> for KmcFile {
    fn from(reader: RandomAccessReader) -> Self {
        Self {
            state: State::RandomAccess(reader),
        }
    }
}

impl From<ListingReader> for KmcFile {
    fn from(reader: ListingReader) -> Self {
        Self {
            state: State::Listing(reader),
        }
    }
}

impl Drop for KmcFile {
    fn drop(&mut self) {
        if self.is_open() {
            debug!("Dropping open database handle");
        }
    }
}
