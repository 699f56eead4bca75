//! MORGANFPS Binary File Format
//!
//! # File Structure
//!
//! ```text
//! Offset    Size    Type        Description
//! ─────────────────────────────────────────────────────────────
//! 0x00      9       [u8; 9]     Magic: "MORGANFPS"
//! 0x09      8       u64 LE      N: Number of fingerprints
//! 0x11      8       u64 LE      L1: Compressed fingerprint block length
//! 0x19      L1      zstd        Fingerprints: N × 32 × u64 LE
//! 0x19+L1   8       u64 LE      L2: Compressed name block length
//! 0x21+L1   L2      zstd        Names: N × i32 LE
//! ```
//!
//! Both blocks are single zstd frames in store (ascending name) order. Each is
//! prefixed by its compressed length so a reader can skip a block without
//! decoding it.
//!
//! # Example
//!
//! ```ignore
//! store.save("library.fps", &SaveOptions::default())?;
//! let loaded = SimilarityStore::open("library.fps")?;
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::names::{Name, NameError, SortedNames};
use crate::store::SimilarityStore;

/// Layout constants shared by the writer and the reader
pub mod schema {
    use crate::fingerprint;
    use crate::names::Name;

    /// Magic bytes identifying a fingerprint file: "MORGANFPS"
    pub const MAGIC: [u8; 9] = *b"MORGANFPS";

    /// Header size in bytes: 9 (magic) + 8 (count) = 17
    pub const HEADER_SIZE: usize = MAGIC.len() + 8;

    /// Size of each compressed-block length prefix
    pub const BLOCK_LEN_SIZE: usize = 8;

    /// Decompressed bytes per fingerprint
    pub const FINGERPRINT_SIZE: usize = fingerprint::BYTES;

    /// Decompressed bytes per name
    pub const NAME_SIZE: usize = std::mem::size_of::<Name>();

    /// Block order within the file
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Block {
        Fingerprints,
        Names,
    }

    impl Block {
        pub fn item_size(&self) -> usize {
            match self {
                Block::Fingerprints => FINGERPRINT_SIZE,
                Block::Names => NAME_SIZE,
            }
        }

        pub fn label(&self) -> &'static str {
            match self {
                Block::Fingerprints => "fingerprint",
                Block::Names => "name",
            }
        }
    }
}

use schema::Block;

/// Smallest accepted compression level
pub const MIN_COMPRESSION_LEVEL: i32 = 1;
/// Largest accepted compression level
pub const MAX_COMPRESSION_LEVEL: i32 = 22;
/// Compression level used when none is given
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File is incompatible, doesn't start with 'MORGANFPS': {found:?}")]
    InvalidMagic { found: String },

    #[error("File truncated while reading {what}")]
    Truncated { what: &'static str },

    #[error("Fingerprint count {0} does not fit in memory")]
    CountTooLarge(u64),

    #[error("The {block} block decompresses to {actual} bytes, expected {expected}")]
    BlockSize {
        block: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("Error decompressing the {block} block: {reason}")]
    Decompress { block: &'static str, reason: String },

    #[error("Names in file are not strictly ascending at {0}")]
    UnsortedNames(Name),

    #[error("Compression level must be between 1 and 22, got {0}")]
    InvalidCompressionLevel(i32),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Validated zstd compression level (1..=22)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    pub fn new(level: i32) -> Result<Self, FileError> {
        if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&level) {
            return Err(FileError::InvalidCompressionLevel(level));
        }
        Ok(Self(level))
    }

    #[inline]
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = FileError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

/// Options for writing a fingerprint file
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    pub compression_level: CompressionLevel,
}

impl SaveOptions {
    pub fn with_level(level: i32) -> Result<Self, FileError> {
        Ok(Self {
            compression_level: CompressionLevel::new(level)?,
        })
    }
}

/// Parsed file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub count: u64,
}

impl FileHeader {
    /// Parse header from raw bytes (first 17 bytes of file)
    pub fn from_bytes(bytes: &[u8; schema::HEADER_SIZE]) -> Result<Self, FileError> {
        let magic = &bytes[..schema::MAGIC.len()];
        if magic != &schema::MAGIC[..] {
            return Err(FileError::InvalidMagic {
                found: String::from_utf8_lossy(magic).into_owned(),
            });
        }
        let mut count = [0u8; 8];
        count.copy_from_slice(&bytes[schema::MAGIC.len()..]);
        Ok(Self {
            count: u64::from_le_bytes(count),
        })
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; schema::HEADER_SIZE] {
        let mut buf = [0u8; schema::HEADER_SIZE];
        buf[..schema::MAGIC.len()].copy_from_slice(&schema::MAGIC);
        buf[schema::MAGIC.len()..].copy_from_slice(&self.count.to_le_bytes());
        buf
    }

    /// Exact decompressed size of a block
    pub fn block_size(&self, block: Block) -> Result<usize, FileError> {
        usize::try_from(self.count)
            .ok()
            .and_then(|n| n.checked_mul(block.item_size()))
            .ok_or(FileError::CountTooLarge(self.count))
    }
}

fn fingerprint_bytes(fps: &[Fingerprint]) -> Cow<'_, [u8]> {
    if cfg!(target_endian = "little") {
        Cow::Borrowed(bytemuck::cast_slice(fps))
    } else {
        Cow::Owned(fps.iter().flat_map(|fp| fp.to_bytes()).collect())
    }
}

fn name_bytes(names: &[Name]) -> Vec<u8> {
    names.iter().flat_map(|n| n.to_le_bytes()).collect()
}

fn write_block<W: Write>(
    writer: &mut W,
    block: Block,
    data: &[u8],
    level: CompressionLevel,
) -> Result<(), FileError> {
    let compressed = zstd::bulk::compress(data, level.get())?;
    tracing::debug!(
        "Compressed {} block: {} -> {} bytes",
        block.label(),
        data.len(),
        compressed.len()
    );
    writer.write_all(&(compressed.len() as u64).to_le_bytes())?;
    writer.write_all(&compressed)?;
    Ok(())
}

/// Serialize a store to any writer
pub fn write_to<W: Write>(
    store: &SimilarityStore,
    writer: &mut W,
    options: &SaveOptions,
) -> Result<(), FileError> {
    let header = FileHeader {
        count: store.len() as u64,
    };
    writer.write_all(&header.to_bytes())?;
    write_block(
        writer,
        Block::Fingerprints,
        &fingerprint_bytes(store.fingerprints()),
        options.compression_level,
    )?;
    write_block(
        writer,
        Block::Names,
        &name_bytes(store.names()),
        options.compression_level,
    )?;
    Ok(())
}

/// Serialize a store into an in-memory buffer
pub fn to_bytes(store: &SimilarityStore, options: &SaveOptions) -> Result<Vec<u8>, FileError> {
    let mut buf = Vec::new();
    write_to(store, &mut buf, options)?;
    Ok(buf)
}

/// Write a store to `path`, replacing any existing file
pub fn save<P: AsRef<Path>>(
    store: &SimilarityStore,
    path: P,
    options: &SaveOptions,
) -> Result<(), FileError> {
    let path = path.as_ref();
    tracing::info!("Writing {} fingerprints to {:?}", store.len(), path);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_to(store, &mut writer, options)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &'static str) -> Result<(), FileError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FileError::Truncated { what },
        _ => FileError::Io(e),
    })
}

/// Read one length-prefixed zstd block and check it decompresses to exactly
/// `expected` bytes.
fn read_block<R: Read>(reader: &mut R, block: Block, expected: usize) -> Result<Vec<u8>, FileError> {
    let label = block.label();
    let mut len = [0u8; schema::BLOCK_LEN_SIZE];
    read_exact(reader, &mut len, label)?;
    let compressed_len = u64::from_le_bytes(len);
    tracing::debug!("The {} block has {} compressed bytes", label, compressed_len);

    // Read through `take` so a corrupt length cannot force a huge allocation
    let mut compressed = Vec::new();
    Read::take(&mut *reader, compressed_len).read_to_end(&mut compressed)?;
    if (compressed.len() as u64) != compressed_len {
        return Err(FileError::Truncated { what: label });
    }

    let frame_len = zstd::zstd_safe::find_frame_compressed_size(&compressed).map_err(|code| {
        FileError::Decompress {
            block: label,
            reason: zstd::zstd_safe::get_error_name(code).to_string(),
        }
    })?;
    if frame_len != compressed.len() {
        return Err(FileError::Decompress {
            block: label,
            reason: format!(
                "inconsistent compressed sizes: {} and {}",
                compressed.len(),
                frame_len
            ),
        });
    }

    let content_size = match zstd::zstd_safe::get_frame_content_size(&compressed) {
        Ok(Some(size)) => size,
        _ => {
            return Err(FileError::Decompress {
                block: label,
                reason: "unknown decompressed frame size".to_string(),
            })
        }
    };
    if content_size != expected as u64 {
        return Err(FileError::BlockSize {
            block: label,
            expected: expected as u64,
            actual: content_size,
        });
    }

    // The declared size comes from the file too, so the output buffer grows
    // with what the frame really produces. The streaming decoder also refuses
    // frames whose window exceeds its default limit.
    let decompress_error = |e: io::Error| FileError::Decompress {
        block: label,
        reason: e.to_string(),
    };
    let mut decoder = zstd::stream::read::Decoder::with_buffer(&compressed[..])
        .map_err(decompress_error)?;
    let mut data = Vec::new();
    Read::take(&mut decoder, expected as u64 + 1)
        .read_to_end(&mut data)
        .map_err(decompress_error)?;
    if data.len() != expected {
        return Err(FileError::BlockSize {
            block: label,
            expected: expected as u64,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}

/// Deserialize a store from any reader
pub fn read_from<R: Read>(reader: &mut R) -> Result<SimilarityStore, FileError> {
    let mut header = [0u8; schema::HEADER_SIZE];
    read_exact(reader, &mut header, "header")?;
    let header = FileHeader::from_bytes(&header)?;
    tracing::info!("Reading {} fingerprints", header.count);

    let fp_bytes = read_block(reader, Block::Fingerprints, header.block_size(Block::Fingerprints)?)?;
    let fingerprints: Vec<Fingerprint> = bytemuck::allocation::pod_collect_to_vec::<u8, Fingerprint>(&fp_bytes)
        .into_iter()
        .map(|fp| Fingerprint::from_words(fp.words().map(u64::from_le)))
        .collect();

    let name_bytes = read_block(reader, Block::Names, header.block_size(Block::Names)?)?;
    let names: Vec<Name> = bytemuck::allocation::pod_collect_to_vec::<u8, Name>(&name_bytes)
        .into_iter()
        .map(Name::from_le)
        .collect();

    let names = SortedNames::from_sorted(names).map_err(|e| match e {
        NameError::Duplicate(name) => FileError::UnsortedNames(name),
        other => FileError::Decompress {
            block: Block::Names.label(),
            reason: other.to_string(),
        },
    })?;

    Ok(SimilarityStore::from_parts(names, fingerprints))
}

/// Deserialize a store from an in-memory buffer
pub fn from_bytes(mut bytes: &[u8]) -> Result<SimilarityStore, FileError> {
    read_from(&mut bytes)
}

/// Load a store from `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<SimilarityStore, FileError> {
    let path = path.as_ref();
    tracing::info!("Loading fingerprints from {:?}", path);
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_from(&mut reader)
}
