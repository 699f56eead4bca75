//! morgan-fps: an in-memory index for 2048-bit Morgan fingerprints
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                SharedStore (reloadable handle)              │
//! │           Arc snapshots for readers · exclusive swap        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │          SimilarityStore · IdentityMap (morgan-core)        │
//! │     exact Tanimoto queries · exact-duplicate detection      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  MORGANFPS file (zstd blocks)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

pub mod shared;

pub use morgan_core::{batch, codec, fingerprint, format, identity, names, store};
pub use morgan_core::{
    decode, tanimoto, tanimoto_encoded, BatchError, CompressionLevel, DecodeError, FileError,
    Fingerprint, FingerprintBatch, Format, IdentityMap, MatchRow, Name, NameError, PairRow,
    RawName, SaveOptions, ScanOptions, SimilarityRow, SimilarityStore, StoreError,
};
pub use shared::SharedStore;

/// Any error raised by the index, for callers that surface errors uniformly
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
