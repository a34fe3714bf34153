//! K-mer module for the kmc-reader library
//!
//! A [`Kmer`] packs a nucleotide sequence into 64-bit registers at two bits per
//! nucleotide, using the mapping `A=00, C=01, G=10, T=11`. Nucleotides are stored
//! most-significant bits first, and the packed data is left-justified on a *byte*
//! boundary: the first register starts with `byte_alignment` unused slots so that
//! `byte_alignment + len` is a multiple of four. This is the same byte layout the
//! database uses for its suffix records, which lets the readers move k-mers in and
//! out of the files without re-encoding every nucleotide.
//!
//! ```text
//! "TAAGA" (len 5, byte_alignment 3)
//! register 0: 00 00 00 11 | 00 00 10 00 | 00 .. 00
//!             pad pad pad T   A  A  G  A
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::KmerError;

/// Width of a register in bits
pub const REGISTER_BITS: usize = 64;

/// Number of bits used to encode one nucleotide
pub const BITS_PER_NUCLEOTIDE: usize = 2;

/// Number of nucleotide slots in one register
pub const NUCLEOTIDES_PER_REGISTER: usize = REGISTER_BITS / BITS_PER_NUCLEOTIDE;

/// Longest k-mer that has a dense 64-bit integer view
pub const MAX_U64_KMER_LEN: usize = NUCLEOTIDES_PER_REGISTER;

/// Capacity of a k-mer created with [`Kmer::new`]
pub const MAX_KMER_LEN: usize = 256;

const INVALID: u8 = 0xFF;

/// ASCII to 2-bit lookup, case-insensitive. Anything outside `ACGTacgt` maps to `INVALID`.
static ENCODE_LUT: [u8; 256] = {
    let mut t = [INVALID; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'c' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'g' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t
};

static DECODE_LUT: [u8; 4] = *b"ACGT";

/// Encodes a single nucleotide into its 2-bit code
#[inline]
#[must_use]
pub fn encode_nucleotide(symbol: u8) -> Option<u8> {
    let code = ENCODE_LUT[symbol as usize];
    (code != INVALID).then_some(code)
}

/// Decodes a 2-bit code into its uppercase nucleotide
#[inline]
#[must_use]
pub fn decode_nucleotide(code: u8) -> u8 {
    DECODE_LUT[(code & 0b11) as usize]
}

/// Number of leading padding slots for a k-mer of `len` nucleotides
#[inline]
#[must_use]
pub fn byte_alignment_for(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Number of bytes in the byte-aligned packed form of a k-mer of `len` nucleotides
#[inline]
#[must_use]
pub fn packed_bytes_for(len: usize) -> usize {
    (len + byte_alignment_for(len)) / 4
}

/// Number of registers needed to hold a k-mer of `len` nucleotides (at least one)
#[inline]
fn registers_for(len: usize) -> usize {
    (len + byte_alignment_for(len))
        .div_ceil(NUCLEOTIDES_PER_REGISTER)
        .max(1)
}

/// Register index and bit shift of a nucleotide slot
#[inline]
fn slot_position(slot: usize) -> (usize, usize) {
    let word = slot / NUCLEOTIDES_PER_REGISTER;
    let shift =
        REGISTER_BITS - BITS_PER_NUCLEOTIDE * (slot % NUCLEOTIDES_PER_REGISTER + 1);
    (word, shift)
}

/// A packed, fixed-capacity k-mer
///
/// Created either empty with [`Kmer::new`] (capacity [`MAX_KMER_LEN`]) or for a fixed
/// length with [`Kmer::with_len`]. Every mutation keeps `len`, `byte_alignment` and the
/// registers consistent, and bits past the last nucleotide are always zero, so two
/// k-mers compare equal exactly when they hold the same sequence.
///
/// Ordering compares the length first and then the packed registers, which for k-mers
/// of equal length is lexicographic order over the nucleotides.
#[derive(Clone, Debug)]
pub struct Kmer {
    /// Number of nucleotides
    length: usize,

    /// Unused leading slots in the first register
    byte_alignment: usize,

    /// Longest sequence this k-mer accepts
    capacity: usize,

    /// Packed registers, most significant nucleotide first
    data: Vec<u64>,
}

impl Default for Kmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Kmer {
    /// Creates an empty k-mer with room for up to [`MAX_KMER_LEN`] nucleotides
    #[must_use]
    pub fn new() -> Self {
        Self {
            length: 0,
            byte_alignment: 0,
            capacity: MAX_KMER_LEN,
            data: vec![0; 1],
        }
    }

    /// Creates a k-mer of `k` nucleotides, all `A`, that accepts at most `k` nucleotides
    #[must_use]
    pub fn with_len(k: usize) -> Self {
        let mut kmer = Self {
            length: 0,
            byte_alignment: 0,
            capacity: k,
            data: Vec::with_capacity(registers_for(k)),
        };
        kmer.reset(k);
        kmer
    }

    /// Builds a k-mer from a nucleotide sequence
    pub fn from_sequence<S: AsRef<[u8]>>(seq: S) -> Result<Self, KmerError> {
        let mut kmer = Self::new();
        kmer.set_sequence(seq)?;
        Ok(kmer)
    }

    /// Builds a k-mer of `len` nucleotides from its byte-aligned packed form
    pub fn from_packed_bytes(len: usize, bytes: &[u8]) -> Result<Self, KmerError> {
        let mut kmer = Self::with_len(len);
        kmer.set_packed_bytes(len, bytes)?;
        Ok(kmer)
    }

    /// Sets the length, recomputes the alignment and zeroes the registers
    fn reset(&mut self, len: usize) {
        self.length = len;
        self.byte_alignment = byte_alignment_for(len);
        self.data.clear();
        self.data.resize(registers_for(len), 0);
    }

    fn check_capacity(&self, len: usize) -> Result<(), KmerError> {
        if len > self.capacity {
            return Err(KmerError::ExceedsCapacity {
                capacity: self.capacity,
                got: len,
            });
        }
        Ok(())
    }

    /// Replaces the contents with a nucleotide sequence
    ///
    /// Symbols are accepted case-insensitively. On error the k-mer is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The sequence is longer than the k-mer's capacity
    /// * The sequence contains a symbol outside of `ACGT`
    pub fn set_sequence<S: AsRef<[u8]>>(&mut self, seq: S) -> Result<(), KmerError> {
        let seq = seq.as_ref();
        self.check_capacity(seq.len())?;
        if let Some(pos) = seq.iter().position(|&b| encode_nucleotide(b).is_none()) {
            return Err(KmerError::InvalidNucleotide {
                symbol: char::from(seq[pos]),
                pos,
            });
        }

        self.reset(seq.len());
        for (pos, &b) in seq.iter().enumerate() {
            let (word, shift) = slot_position(self.byte_alignment + pos);
            self.data[word] |= u64::from(ENCODE_LUT[b as usize]) << shift;
        }
        Ok(())
    }

    /// Replaces the contents with `len` nucleotides given in byte-aligned packed form
    ///
    /// `bytes` must hold exactly [`packed_bytes_for`]`(len)` bytes; padding bits in the
    /// first byte are ignored.
    pub fn set_packed_bytes(&mut self, len: usize, bytes: &[u8]) -> Result<(), KmerError> {
        self.check_capacity(len)?;
        let expected = packed_bytes_for(len);
        if bytes.len() != expected {
            return Err(KmerError::PackedSize {
                len,
                expected,
                got: bytes.len(),
            });
        }

        self.reset(len);
        for (i, &byte) in bytes.iter().enumerate() {
            let byte = if i == 0 {
                byte & (0xFF >> (BITS_PER_NUCLEOTIDE * self.byte_alignment))
            } else {
                byte
            };
            self.data[i / 8] |= u64::from(byte) << (56 - 8 * (i % 8));
        }
        Ok(())
    }

    /// Returns the byte-aligned packed form, padding slots first
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(packed_bytes_for(self.length));
        self.write_bytes(&mut bytes);
        bytes
    }

    /// Appends the byte-aligned packed form to `buf`
    pub fn write_bytes(&self, buf: &mut Vec<u8>) {
        let n_bytes = packed_bytes_for(self.length);
        buf.extend((0..n_bytes).map(|i| (self.data[i / 8] >> (56 - 8 * (i % 8))) as u8));
    }

    /// Number of nucleotides
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Longest sequence this k-mer accepts
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Unused leading nucleotide slots in the first register
    #[must_use]
    pub fn byte_alignment(&self) -> usize {
        self.byte_alignment
    }

    /// The raw first register, padding included
    #[must_use]
    pub fn data0(&self) -> u64 {
        self.data[0]
    }

    /// All packed registers
    #[must_use]
    pub fn registers(&self) -> &[u64] {
        &self.data
    }

    /// The k-mer as an integer with the last nucleotide in the lowest two bits
    ///
    /// This is a dense identity only for `len() <= 32`. Longer k-mers return the first
    /// register unshifted and lose every nucleotide past it; check the length first
    /// when a full-length identity is needed.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        let offset = self.length + self.byte_alignment;
        match offset {
            0 => 0,
            o if o >= NUCLEOTIDES_PER_REGISTER => self.data[0],
            o => self.data[0] >> (REGISTER_BITS - BITS_PER_NUCLEOTIDE * o),
        }
    }

    /// Loads the k-mer from an integer in the layout produced by [`Kmer::as_u64`]
    ///
    /// Bits above the low `2 * len()` bits of `val` are discarded. The length is not
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`KmerError::TooLongForU64`] if the k-mer is longer than 32 nucleotides;
    /// the registers are left untouched.
    pub fn set_u64(&mut self, val: u64) -> Result<(), KmerError> {
        if self.length > MAX_U64_KMER_LEN {
            return Err(KmerError::TooLongForU64(self.length));
        }
        if self.length == 0 {
            return Ok(());
        }
        let used_bits = BITS_PER_NUCLEOTIDE * self.length;
        let masked = if used_bits == REGISTER_BITS {
            val
        } else {
            val & ((1u64 << used_bits) - 1)
        };
        let offset = self.length + self.byte_alignment;
        self.data[0] = masked << (REGISTER_BITS - BITS_PER_NUCLEOTIDE * offset);
        Ok(())
    }

    /// The 2-bit code of the nucleotide at `pos`
    #[must_use]
    pub fn symbol(&self, pos: usize) -> Option<u8> {
        (pos < self.length).then(|| self.symbol_unchecked(pos))
    }

    /// The uppercase nucleotide at `pos`
    #[must_use]
    pub fn ascii_symbol(&self, pos: usize) -> Option<u8> {
        self.symbol(pos).map(decode_nucleotide)
    }

    #[inline]
    fn symbol_unchecked(&self, pos: usize) -> u8 {
        let (word, shift) = slot_position(self.byte_alignment + pos);
        ((self.data[word] >> shift) & 0b11) as u8
    }

    /// Iterates over the 2-bit codes of the nucleotides
    pub fn symbols(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.length).map(|pos| self.symbol_unchecked(pos))
    }

    /// Reverse-complements the k-mer in place
    pub fn reverse_complement(&mut self) {
        let len = self.length;
        let mut out = vec![0u64; self.data.len()];
        for (pos, code) in self.symbols().enumerate() {
            let (word, shift) = slot_position(self.byte_alignment + (len - 1 - pos));
            out[word] |= u64::from(code ^ 0b11) << shift;
        }
        self.data = out;
    }

    /// The lesser of the k-mer and its reverse complement
    #[must_use]
    pub fn canonical(&self) -> Self {
        let mut rc = self.clone();
        rc.reverse_complement();
        if rc < *self {
            rc
        } else {
            self.clone()
        }
    }

    /// Dense multi-word view: nucleotides right-aligned over `ceil(len / 32)` words,
    /// most significant word first
    ///
    /// For `len() <= 32` this is `vec![self.as_u64()]`.
    #[must_use]
    pub fn to_long(&self) -> Vec<u64> {
        let n_words = self.length.div_ceil(NUCLEOTIDES_PER_REGISTER);
        let mut words = vec![0u64; n_words];
        for (pos, code) in self.symbols().enumerate() {
            let from_end = self.length - 1 - pos;
            let word = n_words - 1 - from_end / NUCLEOTIDES_PER_REGISTER;
            words[word] |=
                u64::from(code) << (BITS_PER_NUCLEOTIDE * (from_end % NUCLEOTIDES_PER_REGISTER));
        }
        words
    }
}

impl PartialEq for Kmer {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.data == other.data
    }
}
impl Eq for Kmer {}

impl PartialOrd for Kmer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Kmer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.length
            .cmp(&other.length)
            .then_with(|| self.data.cmp(&other.data))
    }
}

impl Hash for Kmer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        self.data.hash(state);
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.symbols().map(|c| char::from(decode_nucleotide(c))).collect();
        f.write_str(&text)
    }
}

impl FromStr for Kmer {
    type Err = KmerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_sequence(s)
    }
}
