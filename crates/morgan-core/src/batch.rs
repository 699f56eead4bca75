//! Batch input contract
//!
//! A batch is what a calling layer hands over to build an index or run a
//! query: encoded fingerprint strings, optionally a parallel list of raw names,
//! and optionally a format tag (`"full"` or `"rle"`).

use thiserror::Error;

use crate::codec::{self, DecodeError, Format};
use crate::fingerprint::Fingerprint;
use crate::names::{self, Name, NameError, RawName, SortedNames};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Fingerprint {index}: {source}")]
    Entry {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("Got {names} names for {fingerprints} fingerprints")]
    LengthMismatch { fingerprints: usize, names: usize },
}

/// Encoded fingerprints with optional names and format tag
#[derive(Debug, Clone, Default)]
pub struct FingerprintBatch {
    encoded: Vec<String>,
    names: Option<Vec<RawName>>,
    format_tag: Option<String>,
}

impl FingerprintBatch {
    pub fn new<I, S>(encoded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            encoded: encoded.into_iter().map(Into::into).collect(),
            names: None,
            format_tag: None,
        }
    }

    /// Attach caller-supplied names, parallel to the encoded strings
    pub fn with_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<RawName>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Attach the out-of-band format tag. It is validated on decode.
    pub fn with_format_tag(mut self, tag: impl Into<String>) -> Self {
        self.format_tag = Some(tag.into());
        self
    }

    pub fn with_format(self, format: Format) -> Self {
        self.with_format_tag(format.tag())
    }

    pub fn len(&self) -> usize {
        self.encoded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    pub fn format(&self) -> Result<Format, DecodeError> {
        Format::from_tag(self.format_tag.as_deref())
    }

    /// Names in input order; `1..=n` when none were supplied
    pub fn names(&self) -> Result<Vec<Name>, BatchError> {
        match &self.names {
            None => Ok(SortedNames::positional(self.encoded.len())?.as_slice().to_vec()),
            Some(raw) => {
                if raw.len() != self.encoded.len() {
                    return Err(BatchError::LengthMismatch {
                        fingerprints: self.encoded.len(),
                        names: raw.len(),
                    });
                }
                Ok(names::coerce_all(raw)?)
            }
        }
    }

    /// Iterate `(name, fingerprint)` in input order, decoding lazily
    pub fn entries(
        &self,
    ) -> Result<impl Iterator<Item = Result<(Name, Fingerprint), BatchError>> + '_, BatchError>
    {
        let format = self.format()?;
        let names = self.names()?;
        Ok(names
            .into_iter()
            .zip(self.encoded.iter())
            .enumerate()
            .map(move |(index, (name, encoded))| {
                codec::decode(encoded, format)
                    .map(|fp| (name, fp))
                    .map_err(|source| BatchError::Entry { index, source })
            }))
    }

    /// Decode into name-sorted, duplicate-free parallel arrays
    pub fn decode_sorted(&self) -> Result<(SortedNames, Vec<Fingerprint>), BatchError> {
        let format = self.format()?;
        let names = self.names()?;
        let order = names::sort_unique(&names)?;

        let mut sorted = Vec::with_capacity(order.len());
        let mut fingerprints = Vec::with_capacity(order.len());
        for index in order {
            let fp = codec::decode(&self.encoded[index], format)
                .map_err(|source| BatchError::Entry { index, source })?;
            sorted.push(names[index]);
            fingerprints.push(fp);
        }

        tracing::debug!(
            "Decoded {} fingerprints ({} format)",
            fingerprints.len(),
            format
        );
        Ok((SortedNames::from_sorted(sorted)?, fingerprints))
    }
}
