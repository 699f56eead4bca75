//! Exact-duplicate lookup
//!
//! `IdentityMap` hashes the full 2048-bit pattern of every fingerprint in a
//! batch and answers "which stored fingerprint is bitwise identical to this
//! one" for another batch. It is independent of [`crate::SimilarityStore`].

use std::collections::HashMap;

use crate::batch::{BatchError, FingerprintBatch};
use crate::fingerprint::Fingerprint;
use crate::names::Name;

/// A query fingerprint that matched a stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRow {
    /// Name of the query fingerprint
    pub id_1: Name,
    /// Name of the stored fingerprint
    pub id_2: Name,
}

/// Hash map from fingerprint bit pattern to name
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    map: HashMap<Fingerprint, Name>,
}

impl IdentityMap {
    /// Build from a batch. When several entries share a fingerprint the
    /// first one keeps it.
    pub fn build(batch: &FingerprintBatch) -> Result<Self, BatchError> {
        let mut map = HashMap::with_capacity(batch.len());
        for entry in batch.entries()? {
            let (name, fp) = entry?;
            map.entry(fp).or_insert(name);
        }
        tracing::debug!(
            "Identity map holds {} distinct fingerprints from {} inputs",
            map.len(),
            batch.len()
        );
        Ok(Self { map })
    }

    /// Pairs of (query name, stored name) for every query fingerprint that is
    /// present in the map, in query order
    pub fn find_matches(&self, queries: &FingerprintBatch) -> Result<Vec<MatchRow>, BatchError> {
        let mut rows = Vec::new();
        for entry in queries.entries()? {
            let (id_1, fp) = entry?;
            if let Some(&id_2) = self.map.get(&fp) {
                rows.push(MatchRow { id_1, id_2 });
            }
        }
        Ok(rows)
    }

    pub fn get(&self, fp: &Fingerprint) -> Option<Name> {
        self.map.get(fp).copied()
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.map.contains_key(fp)
    }

    /// Number of distinct fingerprints
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
