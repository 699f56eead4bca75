//! Name-sorted fingerprint store
//!
//! Holds two parallel arrays, names (strictly ascending) and fingerprints,
//! built once from a batch or a `MORGANFPS` file. Every query addresses
//! fingerprints by name; names are located with a binary search.
//!
//! All similarity queries are exact and linear. The all-pairs threshold scan
//! is O(n²) and polls a cancellation flag between rows.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::batch::{BatchError, FingerprintBatch};
use crate::fingerprint::{tanimoto, Fingerprint, BYTES};
use crate::format::{self, FileError, SaveOptions};
use crate::names::{self, Name, NameError, RawName, SortedNames};

/// Default number of outer rows between progress reports in the threshold scan
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("Fingerprint {0} not found")]
    NotFound(Name),

    #[error("Threshold scan cancelled")]
    Cancelled,
}

/// Similarity of one stored fingerprint to a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityRow {
    pub id: Name,
    pub similarity: f64,
}

/// Similarity between two named fingerprints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRow {
    pub id_1: Name,
    pub id_2: Name,
    pub similarity: f64,
}

/// Tuning for [`SimilarityStore::tanimoto_threshold_with`]
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Outer rows between progress log lines (0 disables progress logging)
    pub progress_interval: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Immutable, name-sorted fingerprint collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityStore {
    names: SortedNames,
    fingerprints: Vec<Fingerprint>,
}

impl SimilarityStore {
    /// Build a store from an encoded batch
    pub fn from_batch(batch: &FingerprintBatch) -> Result<Self, StoreError> {
        let (names, fingerprints) = batch.decode_sorted()?;
        Ok(Self {
            names,
            fingerprints,
        })
    }

    /// Assemble from already sorted parallel arrays. Lengths must match.
    pub(crate) fn from_parts(names: SortedNames, fingerprints: Vec<Fingerprint>) -> Self {
        debug_assert_eq!(names.len(), fingerprints.len());
        Self {
            names,
            fingerprints,
        }
    }

    /// Load a store from a `MORGANFPS` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        format::load(path)
    }

    /// Write the store to a `MORGANFPS` file
    pub fn save<P: AsRef<Path>>(&self, path: P, options: &SaveOptions) -> Result<(), FileError> {
        format::save(self, path, options)
    }

    /// Number of fingerprints
    #[inline]
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    /// Bytes used by the fingerprint array
    pub fn size_bytes(&self) -> usize {
        self.fingerprints.len() * BYTES
    }

    /// Names in store (ascending) order
    pub fn names(&self) -> &[Name] {
        self.names.as_slice()
    }

    /// Fingerprints in store order, parallel to [`SimilarityStore::names`]
    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn contains(&self, name: Name) -> bool {
        self.names.find(name).is_some()
    }

    /// Fingerprint stored under `name`
    pub fn get(&self, name: impl Into<RawName>) -> Result<&Fingerprint, StoreError> {
        let position = self.locate(&name.into())?;
        Ok(&self.fingerprints[position])
    }

    pub fn iter(&self) -> StoreIter<'_> {
        StoreIter {
            store: self,
            index: 0,
        }
    }

    fn locate(&self, raw: &RawName) -> Result<usize, StoreError> {
        let name = names::coerce(raw)?;
        self.names.find(name).ok_or(StoreError::NotFound(name))
    }

    /// Positions for a list of raw names, sorted by name; duplicates are fatal
    fn locate_all(&self, raw: &[RawName]) -> Result<(Vec<Name>, Vec<usize>), StoreError> {
        let sorted = names::sorted_unique(raw)?;
        let positions = self.names.find_all(&sorted).map_err(StoreError::NotFound)?;
        Ok((sorted, positions))
    }

    /// Similarity between fingerprints `i` and `j`
    pub fn tanimoto(
        &self,
        i: impl Into<RawName>,
        j: impl Into<RawName>,
    ) -> Result<f64, StoreError> {
        let a = self.locate(&i.into())?;
        let b = self.locate(&j.into())?;
        Ok(tanimoto(&self.fingerprints[a], &self.fingerprints[b]))
    }

    /// Similarity of fingerprint `i` to every stored fingerprint, in store order
    pub fn tanimoto_all(&self, i: impl Into<RawName>) -> Result<Vec<SimilarityRow>, StoreError> {
        let query = &self.fingerprints[self.locate(&i.into())?];
        Ok(self
            .iter()
            .map(|(id, fp)| SimilarityRow {
                id,
                similarity: tanimoto(fp, query),
            })
            .collect())
    }

    /// All pairs with similarity strictly above `threshold`.
    ///
    /// Returns [`StoreError::Cancelled`] as soon as `cancel` is observed set
    /// between two outer rows.
    pub fn tanimoto_threshold(
        &self,
        threshold: f64,
        cancel: &AtomicBool,
    ) -> Result<Vec<PairRow>, StoreError> {
        self.tanimoto_threshold_with(threshold, cancel, &ScanOptions::default())
    }

    pub fn tanimoto_threshold_with(
        &self,
        threshold: f64,
        cancel: &AtomicBool,
        options: &ScanOptions,
    ) -> Result<Vec<PairRow>, StoreError> {
        let n = self.len();
        let names = self.names.as_slice();
        let mut rows = Vec::new();

        for i in 0..n {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!("Threshold scan cancelled at row {}/{}", i, n);
                return Err(StoreError::Cancelled);
            }
            if options.progress_interval > 0 && i % options.progress_interval == 0 {
                let pct = (i as f64 / n as f64) * 100.0;
                tracing::info!("Threshold scan: {:.0}% ({}/{})", pct, i, n);
            }

            let fp_i = &self.fingerprints[i];
            for j in (i + 1)..n {
                let similarity = tanimoto(fp_i, &self.fingerprints[j]);
                if similarity > threshold {
                    rows.push(PairRow {
                        id_1: names[i],
                        id_2: names[j],
                        similarity,
                    });
                }
            }
        }

        Ok(rows)
    }

    /// Cross similarities of the set `x` against `y`, or against the whole
    /// store when `y` is `None`. Rows are `x` outer, `y` inner, both sorted
    /// by name.
    pub fn tanimoto_subset(
        &self,
        x: &[RawName],
        y: Option<&[RawName]>,
    ) -> Result<Vec<PairRow>, StoreError> {
        let (x_names, x_positions) = self.locate_all(x)?;
        let (y_names, y_positions) = match y {
            Some(y) => self.locate_all(y)?,
            None => (self.names.as_slice().to_vec(), (0..self.len()).collect()),
        };

        let mut rows = Vec::with_capacity(x_names.len() * y_names.len());
        for (&id_1, &a) in x_names.iter().zip(&x_positions) {
            let fp_a = &self.fingerprints[a];
            for (&id_2, &b) in y_names.iter().zip(&y_positions) {
                rows.push(PairRow {
                    id_1,
                    id_2,
                    similarity: tanimoto(fp_a, &self.fingerprints[b]),
                });
            }
        }
        Ok(rows)
    }

    /// Similarities of external fingerprints against the whole store.
    ///
    /// `id_1` is the external name, `id_2` the stored name. Rows are store
    /// outer, external (sorted by name) inner.
    pub fn tanimoto_ext(&self, batch: &FingerprintBatch) -> Result<Vec<PairRow>, StoreError> {
        let (ext_names, ext_fps) = batch.decode_sorted()?;

        let mut rows = Vec::with_capacity(self.len() * ext_fps.len());
        for (id_2, fp) in self.iter() {
            for (id_1, ext) in ext_names.iter().zip(&ext_fps) {
                rows.push(PairRow {
                    id_1,
                    id_2,
                    similarity: tanimoto(fp, ext),
                });
            }
        }
        Ok(rows)
    }
}

/// Iterator over `(name, fingerprint)` in store order
pub struct StoreIter<'a> {
    store: &'a SimilarityStore,
    index: usize,
}

impl<'a> Iterator for StoreIter<'a> {
    type Item = (Name, &'a Fingerprint);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.store.names.get(self.index)?;
        let fp = &self.store.fingerprints[self.index];
        self.index += 1;
        Some((name, fp))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.store.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for StoreIter<'a> {}
