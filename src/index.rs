//! Prefix table module
//!
//! The prefix table maps every `p`-nucleotide prefix to the first suffix record that
//! starts with it. Records of prefix `i` occupy `table[i]..table[i + 1]`, and the reader
//! appends `total_kmers` as the closing entry, so a lookup is one table read followed by
//! a binary search over a short run of suffixes.

use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;

use crate::{
    error::{HeaderError, Result},
    header::{
        KmcHeader, PREFIX_MARKER, SIZE_HEADER, SIZE_HEADER_OFFSET, SIZE_MARKER,
    },
};

#[derive(Debug, Clone)]
pub(crate) struct PrefixTable {
    /// Cumulative record offsets, `4^p + 1` entries
    entries: Vec<u64>,
}
impl PrefixTable {
    /// Parses the full contents of a prefix file into its header and table
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Either `KMCP` marker is missing
    /// * The header offset or header is invalid
    /// * The file size does not match the prefix length in the header
    /// * The table is not non-decreasing or points past the last record
    pub fn parse(bytes: &[u8]) -> Result<(KmcHeader, Self)> {
        let min_size = 2 * SIZE_MARKER + SIZE_HEADER + SIZE_HEADER_OFFSET;
        if bytes.len() < min_size {
            return Err(HeaderError::InvalidSize(bytes.len(), min_size).into());
        }
        let len = bytes.len();
        if &bytes[..SIZE_MARKER] != PREFIX_MARKER || &bytes[len - SIZE_MARKER..] != PREFIX_MARKER {
            return Err(HeaderError::InvalidMarker("KMCP").into());
        }

        let offset_pos = len - SIZE_MARKER - SIZE_HEADER_OFFSET;
        let header_offset = LittleEndian::read_u32(&bytes[offset_pos..offset_pos + SIZE_HEADER_OFFSET]);
        if header_offset as usize != SIZE_HEADER {
            return Err(HeaderError::InvalidHeaderOffset(header_offset, SIZE_HEADER as u32).into());
        }
        let header_pos = offset_pos - SIZE_HEADER;
        let header = KmcHeader::from_buffer(&bytes[header_pos..offset_pos])?;

        let expected = header.prefix_file_size();
        if len != expected {
            return Err(HeaderError::InvalidSize(len, expected).into());
        }

        header.suffix_file_size()?;

        let mut entries = vec![0u64; header.prefix_entries() + 1];
        let n_prefixes = header.prefix_entries();
        LittleEndian::read_u64_into(&bytes[SIZE_MARKER..header_pos], &mut entries[..n_prefixes]);
        entries[n_prefixes] = header.total_kmers;

        if entries[0] != 0 {
            return Err(HeaderError::CorruptPrefixTable(0).into());
        }
        if let Some(pos) = entries.windows(2).position(|w| w[0] > w[1]) {
            return Err(HeaderError::CorruptPrefixTable(pos).into());
        }

        Ok((header, Self { entries }))
    }

    /// Number of prefixes in the table
    pub fn n_prefixes(&self) -> usize {
        self.entries.len() - 1
    }

    /// Record indices holding the suffixes of `prefix`
    #[inline]
    pub fn range(&self, prefix: usize) -> Range<u64> {
        self.entries[prefix]..self.entries[prefix + 1]
    }

    /// One past the last record index of `prefix`
    #[inline]
    pub fn end_of(&self, prefix: usize) -> u64 {
        self.entries[prefix + 1]
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::Error;
    use anyhow::Result;

    fn prefix_file(header: &KmcHeader, table: &[u64]) -> Result<Vec<u8>> {
        let mut buf = PREFIX_MARKER.to_vec();
        for entry in table {
            buf.extend_from_slice(&entry.to_le_bytes());
        }
        header.write_bytes(&mut buf)?;
        buf.extend_from_slice(&(SIZE_HEADER as u32).to_le_bytes());
        buf.extend_from_slice(PREFIX_MARKER);
        Ok(buf)
    }

    #[test]
    fn test_parse_table() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, 10);
        let bytes = prefix_file(&header, &[0, 2, 2, 7])?;
        let (parsed, table) = PrefixTable::parse(&bytes)?;
        assert_eq!(parsed, header);
        assert_eq!(table.n_prefixes(), 4);
        assert_eq!(table.range(0), 0..2);
        assert_eq!(table.range(1), 2..2);
        assert_eq!(table.range(3), 7..10);
        assert_eq!(table.end_of(3), 10);
        Ok(())
    }

    #[test]
    fn test_rejects_decreasing_table() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, 10);
        let bytes = prefix_file(&header, &[0, 4, 3, 7])?;
        assert!(matches!(
            PrefixTable::parse(&bytes),
            Err(Error::HeaderError(HeaderError::CorruptPrefixTable(1)))
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_table_not_starting_at_zero() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, 2);
        let bytes = prefix_file(&header, &[1, 1, 1, 1])?;
        assert!(matches!(
            PrefixTable::parse(&bytes),
            Err(Error::HeaderError(HeaderError::CorruptPrefixTable(0)))
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_unaddressable_entry_count() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, u64::MAX);
        let bytes = prefix_file(&header, &[0, 0, 0, 0])?;
        assert!(matches!(
            PrefixTable::parse(&bytes),
            Err(Error::HeaderError(HeaderError::TooManyKmers(u64::MAX)))
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_table_past_total() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, 5);
        let bytes = prefix_file(&header, &[0, 2, 3, 7])?;
        assert!(matches!(
            PrefixTable::parse(&bytes),
            Err(Error::HeaderError(HeaderError::CorruptPrefixTable(3)))
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_missing_marker() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, 0);
        let mut bytes = prefix_file(&header, &[0, 0, 0, 0])?;
        let last = bytes.len() - 1;
        bytes[last] = b'X';
        assert!(matches!(
            PrefixTable::parse(&bytes),
            Err(Error::HeaderError(HeaderError::InvalidMarker("KMCP")))
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_wrong_table_size() -> Result<()> {
        let header = KmcHeader::new(5, 1, 1, 0);
        let bytes = prefix_file(&header, &[0, 0, 0])?;
        assert!(matches!(
            PrefixTable::parse(&bytes),
            Err(Error::HeaderError(HeaderError::InvalidSize(..)))
        ));
        Ok(())
    }
}
