//! Fingerprint names
//!
//! Callers identify fingerprints by signed 32-bit integers. Names arrive as
//! integers, floats, or strings holding an integer (`"42"`, `"1e+07"`) and are
//! coerced into [`Name`]. A store keeps its names sorted and unique so lookups
//! are a binary search.

use std::fmt;

use thiserror::Error;

/// Canonical fingerprint identifier
pub type Name = i32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NameError {
    #[error(
        "Fingerprint names must be passed as integers, numerics, or strings representing integers; got {0}"
    )]
    Format(String),

    #[error("Duplicate names are not allowed: {0}")]
    Duplicate(Name),

    #[error("Cannot auto-assign names to {0} fingerprints, the largest name is {max}", max = Name::MAX)]
    TooMany(usize),
}

/// A name as supplied by a caller, before coercion
#[derive(Debug, Clone, PartialEq)]
pub enum RawName {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for RawName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawName::Int(v) => write!(f, "{v}"),
            RawName::Float(v) => write!(f, "{v}"),
            RawName::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i32> for RawName {
    fn from(v: i32) -> Self {
        RawName::Int(i64::from(v))
    }
}

impl From<i64> for RawName {
    fn from(v: i64) -> Self {
        RawName::Int(v)
    }
}

impl From<u32> for RawName {
    fn from(v: u32) -> Self {
        RawName::Int(i64::from(v))
    }
}

impl From<f64> for RawName {
    fn from(v: f64) -> Self {
        RawName::Float(v)
    }
}

impl From<&str> for RawName {
    fn from(v: &str) -> Self {
        RawName::Str(v.to_string())
    }
}

impl From<String> for RawName {
    fn from(v: String) -> Self {
        RawName::Str(v)
    }
}

fn from_float(v: f64, raw: &RawName) -> Result<Name, NameError> {
    let truncated = v.trunc();
    if !truncated.is_finite()
        || truncated < f64::from(Name::MIN)
        || truncated > f64::from(Name::MAX)
    {
        return Err(NameError::Format(raw.to_string()));
    }
    Ok(truncated as Name)
}

/// Coerce a raw name into a [`Name`].
///
/// Floats (and strings, which are parsed as floats to accept forms such as
/// `"1e+07"`) are truncated toward zero. Values outside the `i32` range,
/// non-finite values and unparsable strings are rejected.
pub fn coerce(raw: &RawName) -> Result<Name, NameError> {
    match raw {
        RawName::Int(v) => Name::try_from(*v).map_err(|_| NameError::Format(raw.to_string())),
        RawName::Float(v) => from_float(*v, raw),
        RawName::Str(s) => {
            let parsed: f64 = s
                .trim()
                .parse()
                .map_err(|_| NameError::Format(raw.to_string()))?;
            from_float(parsed, raw)
        }
    }
}

/// Coerce every raw name, keeping input order
pub fn coerce_all(raw: &[RawName]) -> Result<Vec<Name>, NameError> {
    raw.iter().map(coerce).collect()
}

/// Permutation that sorts `names` ascending.
///
/// Fails on the first pair of equal names.
pub fn sort_unique(names: &[Name]) -> Result<Vec<usize>, NameError> {
    let mut order: Vec<usize> = (0..names.len()).collect();
    order.sort_by_key(|&i| names[i]);
    if let Some(pair) = order.windows(2).find(|w| names[w[0]] == names[w[1]]) {
        return Err(NameError::Duplicate(names[pair[0]]));
    }
    Ok(order)
}

/// Coerce, sort and deduplicate-check a list of raw names
pub fn sorted_unique(raw: &[RawName]) -> Result<Vec<Name>, NameError> {
    let names = coerce_all(raw)?;
    let order = sort_unique(&names)?;
    Ok(order.into_iter().map(|i| names[i]).collect())
}

/// Owned, strictly ascending name array with binary-search lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedNames(Vec<Name>);

impl SortedNames {
    /// Wrap names that are already strictly ascending.
    ///
    /// Returns the offending name if the order is violated.
    pub fn from_sorted(names: Vec<Name>) -> Result<Self, NameError> {
        if let Some(w) = names.windows(2).find(|w| w[0] >= w[1]) {
            return Err(NameError::Duplicate(w[1]));
        }
        Ok(Self(names))
    }

    /// Auto-assigned names `1..=n`
    pub fn positional(n: usize) -> Result<Self, NameError> {
        let last = Name::try_from(n).map_err(|_| NameError::TooMany(n))?;
        Ok(Self((1..=last).collect()))
    }

    /// Position of `name`, if present
    #[inline]
    pub fn find(&self, name: Name) -> Option<usize> {
        self.0.binary_search(&name).ok()
    }

    /// Positions of an ascending list of names.
    ///
    /// Each search starts where the previous one ended. Returns the first
    /// missing name as the error.
    pub fn find_all(&self, sorted: &[Name]) -> Result<Vec<usize>, Name> {
        let mut positions = Vec::with_capacity(sorted.len());
        let mut lower = 0;
        for &name in sorted {
            match self.0[lower..].binary_search(&name) {
                Ok(offset) => {
                    lower += offset;
                    positions.push(lower);
                }
                Err(_) => return Err(name),
            }
        }
        Ok(positions)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Name] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<Name> {
        self.0.get(position).copied()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Name> + '_ {
        self.0.iter().copied()
    }
}
