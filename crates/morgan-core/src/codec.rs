//! Fingerprint string codecs
//!
//! Two wire encodings are accepted, selected by a format tag that travels with
//! a batch of fingerprints:
//!
//! | Tag      | Format                    | Payload                                   |
//! |----------|---------------------------|-------------------------------------------|
//! | `"full"` | [`Format::Plain`]         | 512 hex chars = the 256 raw bytes         |
//! | `"rle"`  | [`Format::LegacyPacked`]  | hex of a legacy BitVect binary pickle     |
//!
//! # Legacy pickle layout
//!
//! ```text
//! i32 LE   size, or -version (16 | 32) followed by i32 LE size
//! u32 LE   nOn: number of set bits
//! ...      positions, encoded per `Encoding`
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::fingerprint::{self, Fingerprint, BITS, BYTES};

/// Length of a plain hex fingerprint string
pub const PLAIN_HEX_LEN: usize = BYTES * 2;

/// Sizes at or above this store on-bits as u32 under version 16
const U16_SIZE_LIMIT: i32 = u16::MAX as i32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Input hex string must be of length {expected}, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("Hex input length must be a multiple of 2, got {0}")]
    OddLength(usize),

    #[error("Hex string may only contain characters in [0-9A-Fa-f]: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Unknown fingerprint format: {0:?}")]
    UnknownFormat(String),

    #[error("Bad version in BitVect pickle: {0}")]
    BadVersion(i32),

    #[error("BitVect pickle truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        needed: usize,
        offset: usize,
        available: usize,
    },

    #[error("Bit position {0} out of range for a 2048-bit fingerprint")]
    BitOutOfRange(u64),
}

/// Wire encoding of a single fingerprint string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// 512-character hex image of the raw fingerprint bytes
    #[default]
    Plain,
    /// Hex-encoded legacy run-length binary pickle
    LegacyPacked,
}

impl Format {
    pub fn tag(&self) -> &'static str {
        match self {
            Format::Plain => "full",
            Format::LegacyPacked => "rle",
        }
    }

    /// Resolve an optional out-of-band tag; absence means [`Format::Plain`]
    pub fn from_tag(tag: Option<&str>) -> Result<Self, DecodeError> {
        tag.map_or(Ok(Format::Plain), str::parse)
    }
}

impl FromStr for Format {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Format::Plain),
            "rle" => Ok(Format::LegacyPacked),
            other => Err(DecodeError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Decode one encoded fingerprint
pub fn decode(encoded: &str, format: Format) -> Result<Fingerprint, DecodeError> {
    match format {
        Format::Plain => decode_plain(encoded),
        Format::LegacyPacked => decode_packed(encoded),
    }
}

/// Tanimoto similarity of two encoded fingerprints sharing one format
pub fn tanimoto_encoded(a: &str, b: &str, format: Format) -> Result<f64, DecodeError> {
    let fa = decode(a, format)?;
    let fb = decode(b, format)?;
    Ok(fingerprint::tanimoto(&fa, &fb))
}

fn decode_plain(encoded: &str) -> Result<Fingerprint, DecodeError> {
    if encoded.len() != PLAIN_HEX_LEN {
        return Err(DecodeError::Length {
            expected: PLAIN_HEX_LEN,
            actual: encoded.len(),
        });
    }
    let mut bytes = [0u8; BYTES];
    hex::decode_to_slice(encoded, &mut bytes)?;
    Ok(Fingerprint::from_bytes(&bytes))
}

fn decode_packed(encoded: &str) -> Result<Fingerprint, DecodeError> {
    if encoded.len() % 2 != 0 {
        return Err(DecodeError::OddLength(encoded.len()));
    }
    let raw = hex::decode(encoded)?;
    decode_pickle(&raw)
}

/// How set-bit positions are laid out after the pickle header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Each position is a u32 LE
    RawU32,
    /// Each position is a u16 LE
    RawU16,
    /// Delta run-length encoding with packed variable-width integers
    DeltaRle,
}

/// Parsed pickle header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickleHeader {
    /// 0 for unversioned pickles, otherwise 16 or 32
    pub version: i32,
    pub size: i32,
    pub num_on: u32,
}

impl PickleHeader {
    pub fn encoding(&self) -> Encoding {
        match self.version {
            16 if self.size < U16_SIZE_LIMIT => Encoding::RawU16,
            32 => Encoding::DeltaRle,
            _ => Encoding::RawU32,
        }
    }
}

/// Bounds-checked little-endian reader over a pickle
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        if end > self.data.len() {
            return Err(DecodeError::Truncated {
                needed: N,
                offset: self.pos,
                available: self.data.len() - self.pos,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    /// Packed integer: the low bits of the first byte select a width of
    /// 1, 2, 3 or 4 bytes, each width tier adding a fixed offset.
    fn packed_u32(&mut self) -> Result<u32, DecodeError> {
        let mut val = u32::from(self.u8()?);
        let (shift, offset) = if val & 1 == 0 {
            (1, 0)
        } else if val & 3 == 1 {
            val |= u32::from(self.u8()?) << 8;
            (2, 1 << 7)
        } else if val & 7 == 3 {
            val |= u32::from(self.u8()?) << 8;
            val |= u32::from(self.u8()?) << 16;
            (3, (1 << 7) + (1 << 14))
        } else {
            val |= u32::from(self.u8()?) << 8;
            val |= u32::from(self.u8()?) << 16;
            val |= u32::from(self.u8()?) << 24;
            (3, (1 << 7) + (1 << 14) + (1 << 21))
        };
        Ok((val >> shift) + offset)
    }
}

fn read_header(reader: &mut Reader<'_>) -> Result<PickleHeader, DecodeError> {
    let first = reader.i32()?;
    let (version, size) = if first < 0 {
        let version = first.checked_neg().unwrap_or(i32::MIN);
        if version != 16 && version != 32 {
            return Err(DecodeError::BadVersion(version));
        }
        (version, reader.i32()?)
    } else {
        // Unversioned pickles start directly with the size
        (0, first)
    };
    let num_on = reader.u32()?;
    Ok(PickleHeader {
        version,
        size,
        num_on,
    })
}

fn set_position(fp: &mut Fingerprint, position: u64) -> Result<(), DecodeError> {
    if position >= BITS as u64 {
        return Err(DecodeError::BitOutOfRange(position));
    }
    fp.set_bit(position as usize);
    Ok(())
}

/// Decode a raw (already hex-decoded) legacy pickle
pub fn decode_pickle(raw: &[u8]) -> Result<Fingerprint, DecodeError> {
    let mut reader = Reader::new(raw);
    let header = read_header(&mut reader)?;
    let mut fp = Fingerprint::zero();

    match header.encoding() {
        Encoding::RawU32 => {
            for _ in 0..header.num_on {
                set_position(&mut fp, u64::from(reader.u32()?))?;
            }
        }
        Encoding::RawU16 => {
            for _ in 0..header.num_on {
                set_position(&mut fp, u64::from(reader.u16()?))?;
            }
        }
        Encoding::DeltaRle => {
            let mut cursor: u64 = 0;
            for _ in 0..header.num_on {
                cursor += u64::from(reader.packed_u32()?);
                set_position(&mut fp, cursor)?;
                cursor += 1;
            }
        }
    }

    Ok(fp)
}
