//! Test fixtures: writes small databases in the two-file layout into temporary directories.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use kmc_reader::{DatabasePaths, KmcHeader, PREFIX_MARKER, SIZE_HEADER, SUFFIX_MARKER};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tempfile::TempDir;

/// Geometry and metadata of a fixture database
#[derive(Debug, Clone, Copy)]
pub struct FixtureConfig {
    pub k: u32,
    pub lut_prefix_length: u32,
    pub counter_size: u32,
    pub both_strands: bool,
    pub min_count: u32,
    pub max_count: u64,
}
impl FixtureConfig {
    pub fn new(k: u32, lut_prefix_length: u32) -> Self {
        Self {
            k,
            lut_prefix_length,
            counter_size: 4,
            both_strands: true,
            min_count: 1,
            max_count: u64::from(u32::MAX),
        }
    }
    pub fn counter_size(mut self, counter_size: u32) -> Self {
        self.counter_size = counter_size;
        self
    }
    pub fn single_strand(mut self) -> Self {
        self.both_strands = false;
        self
    }
}

/// A database written to a temporary directory, removed on drop
pub struct Fixture {
    _dir: TempDir,
    pub stem: PathBuf,
    pub config: FixtureConfig,
    pub entries: BTreeMap<String, u64>,
}
impl Fixture {
    pub fn build(config: FixtureConfig, entries: BTreeMap<String, u64>) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let stem = dir.path().join("db");
        write_database(&stem, &config, &entries)?;
        Ok(Self {
            _dir: dir,
            stem,
            config,
            entries,
        })
    }

    pub fn paths(&self) -> DatabasePaths {
        DatabasePaths::resolve(&self.stem)
    }
}

/// Packs a sequence byte-aligned, padding first, independently of the library codec
pub fn pack(seq: &str) -> Vec<u8> {
    let align = (4 - seq.len() % 4) % 4;
    let mut bytes = vec![0u8; (seq.len() + align) / 4];
    for (i, b) in seq.bytes().enumerate() {
        let code = match b {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => panic!("invalid fixture nucleotide {}", b as char),
        };
        let slot = align + i;
        bytes[slot / 4] |= code << (6 - 2 * (slot % 4));
    }
    bytes
}

/// Writes `entries` (sorted by k-mer) as `<stem>.kmc_pre` and `<stem>.kmc_suf`
pub fn write_database(stem: &Path, config: &FixtureConfig, entries: &BTreeMap<String, u64>) -> Result<()> {
    let mut header = KmcHeader::new(
        config.k,
        config.lut_prefix_length,
        config.counter_size,
        entries.len() as u64,
    );
    header.both_strands = config.both_strands;
    header.min_count = config.min_count;
    header.max_count = config.max_count;

    let paths = DatabasePaths::resolve(stem);
    let prefix_bytes = header.prefix_bytes();
    let mut per_prefix = vec![0u64; header.prefix_entries()];

    let mut suffix_file = BufWriter::new(File::create(&paths.suffix)?);
    suffix_file.write_all(SUFFIX_MARKER)?;
    for (seq, &count) in entries {
        assert_eq!(seq.len(), config.k as usize, "fixture k-mer {seq} has the wrong length");
        let packed = pack(seq);
        let prefix = packed[..prefix_bytes]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        per_prefix[prefix] += 1;
        suffix_file.write_all(&packed[prefix_bytes..])?;
        suffix_file.write_all(&count.to_le_bytes()[..config.counter_size as usize])?;
    }
    suffix_file.write_all(SUFFIX_MARKER)?;
    suffix_file.flush()?;

    let mut prefix_file = BufWriter::new(File::create(&paths.prefix)?);
    prefix_file.write_all(PREFIX_MARKER)?;
    let mut offset = 0u64;
    for n in per_prefix {
        prefix_file.write_all(&offset.to_le_bytes())?;
        offset += n;
    }
    header.write_bytes(&mut prefix_file)?;
    prefix_file.write_all(&(SIZE_HEADER as u32).to_le_bytes())?;
    prefix_file.write_all(PREFIX_MARKER)?;
    prefix_file.flush()?;
    Ok(())
}

/// Decodes a dense k-mer code (`A=0 .. T=3`, last nucleotide lowest) into text
pub fn decode(code: u64, k: usize) -> String {
    (0..k)
        .rev()
        .map(|i| b"ACGT"[((code >> (2 * i)) & 0b11) as usize] as char)
        .collect()
}

/// The reference scenario: k = 5, 291 entries, `TAAGA` stored with count 4
pub fn test1_entries() -> BTreeMap<String, u64> {
    let mut entries: BTreeMap<String, u64> = (0..875u64)
        .filter(|code| code % 3 == 2)
        .map(|code| (decode(code, 5), code % 11 + 1))
        .collect();
    entries.insert("TAAGA".to_string(), 4);
    entries
}

pub fn test1() -> Result<Fixture> {
    Fixture::build(FixtureConfig::new(5, 1).counter_size(1), test1_entries())
}

/// `n` distinct random k-mers with counts in `1..=max_count`
pub fn random_entries(k: usize, n: usize, max_count: u64, seed: u64) -> BTreeMap<String, u64> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut entries = BTreeMap::new();
    while entries.len() < n {
        let seq: String = (0..k)
            .map(|_| b"ACGT"[rng.random_range(0..4)] as char)
            .collect();
        let count = rng.random_range(1..=max_count);
        entries.insert(seq, count);
    }
    entries
}

/// A k-mer of length `k` absent from `entries`
pub fn absent_kmer(entries: &BTreeMap<String, u64>, k: usize, seed: u64) -> String {
    let mut rng = SmallRng::seed_from_u64(seed);
    loop {
        let seq: String = (0..k)
            .map(|_| b"ACGT"[rng.random_range(0..4)] as char)
            .collect();
        if !entries.contains_key(&seq) {
            return seq;
        }
    }
}

/// Writes a database from a header, prefix table and suffix body verbatim, without
/// checking that they agree
pub fn write_raw_database(stem: &Path, header: &KmcHeader, table: &[u64], records: &[u8]) -> Result<()> {
    let paths = DatabasePaths::resolve(stem);

    let mut prefix_file = BufWriter::new(File::create(&paths.prefix)?);
    prefix_file.write_all(PREFIX_MARKER)?;
    for entry in table {
        prefix_file.write_all(&entry.to_le_bytes())?;
    }
    header.write_bytes(&mut prefix_file)?;
    prefix_file.write_all(&(SIZE_HEADER as u32).to_le_bytes())?;
    prefix_file.write_all(PREFIX_MARKER)?;
    prefix_file.flush()?;

    let mut suffix_file = BufWriter::new(File::create(&paths.suffix)?);
    suffix_file.write_all(SUFFIX_MARKER)?;
    suffix_file.write_all(records)?;
    suffix_file.write_all(SUFFIX_MARKER)?;
    suffix_file.flush()?;
    Ok(())
}
