//! Morgan Core – Fingerprint codec, similarity index and MORGANFPS file format
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │      SimilarityStore (name-sorted)     │    IdentityMap      │
//! │  tanimoto · all · threshold · subset   │  exact duplicates   │
//! │                 · ext                  │                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │   FingerprintBatch · names (coerce, sort-unique, lookup)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │   codec (plain hex, legacy packed) · Fingerprint (popcnt)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │              format (MORGANFPS, zstd blocks)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod codec;
pub mod fingerprint;
pub mod format;
pub mod identity;
pub mod names;
pub mod store;

pub use batch::{BatchError, FingerprintBatch};
pub use codec::{decode, tanimoto_encoded, DecodeError, Format};
pub use fingerprint::{tanimoto, Fingerprint};
pub use format::{CompressionLevel, FileError, SaveOptions};
pub use identity::{IdentityMap, MatchRow};
pub use names::{Name, NameError, RawName};
pub use store::{PairRow, ScanOptions, SimilarityRow, SimilarityStore, StoreError};
