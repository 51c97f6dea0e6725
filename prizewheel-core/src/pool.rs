//! Candidate pools and the builders that produce them.
//!
//! Every entry carries a fixed-width zero-padded code (`001`..`999`). Pools
//! remember how they were built so a context can regenerate or re-fetch them.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_RANGE_MAX, ID_WIDTH, MAX_ENTRY_NUMBER, MIN_ENTRY_NUMBER};

/// Errors raised while building a pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("range {min}..={max} is invalid; bounds must satisfy 1 <= min <= max <= 999")]
    InvalidRange { min: i64, max: i64 },
    #[error("{count} entrants cannot be numbered with 3 digits (limit 999)")]
    TooManyEntries { count: usize },
}

/// Zero-padded fixed-width entry code, e.g. `"007"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    /// Build the code for `number`, returning `None` outside `1..=999`.
    #[must_use]
    pub fn from_number(number: u16) -> Option<Self> {
        if (MIN_ENTRY_NUMBER..=MAX_ENTRY_NUMBER).contains(&number) {
            Some(Self(format!("{number:0width$}", width = ID_WIDTH)))
        } else {
            None
        }
    }

    /// Parse an already padded code such as `"042"`.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() != ID_WIDTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u16 = code.parse().ok()?;
        Self::from_number(number)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the code.
    #[must_use]
    pub fn number(&self) -> u16 {
        self.0.parse().unwrap_or(0)
    }

    /// Digit at `index` (0 = hundreds).
    #[must_use]
    pub fn digit(&self, index: usize) -> Option<char> {
        self.0.chars().nth(index)
    }

    /// The first `len` digits, clamped to the code width.
    #[must_use]
    pub fn prefix(&self, len: usize) -> &str {
        &self.0[..len.min(ID_WIDTH)]
    }

    /// Whether the first `len` digits agree with `other`.
    #[must_use]
    pub fn shares_prefix(&self, other: &Self, len: usize) -> bool {
        self.prefix(len) == other.prefix(len)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntryId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid entry code '{value}'"))
    }
}

impl From<EntryId> for String {
    fn from(value: EntryId) -> Self {
        value.0
    }
}

/// One drawable slot in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(default)]
    pub label: Option<String>,
}

impl Entry {
    #[must_use]
    pub const fn new(id: EntryId, label: Option<String>) -> Self {
        Self { id, label }
    }

    /// Text used by list views: `"003 - name"` or just `"003"`.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => format!("{} - {label}", self.id),
            _ => self.id.to_string(),
        }
    }
}

/// Entrant as resolved by the rewards collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    /// Opaque upstream identifier; not used for numbering.
    #[serde(default)]
    pub id: String,
    #[serde(alias = "displayName", alias = "user_name")]
    pub display_name: String,
}

impl Entrant {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// How a pool was produced, used to rebuild it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolSource {
    Range { min: u16, max: u16 },
    Entrants,
}

/// Ordered candidate list for one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    source: PoolSource,
    entries: Vec<Entry>,
}

impl Pool {
    /// Pool for an entrant context that has not been loaded yet.
    #[must_use]
    pub const fn unloaded() -> Self {
        Self {
            source: PoolSource::Entrants,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub const fn source(&self) -> PoolSource {
        self.source
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &EntryId) -> bool {
        self.get(id).is_some()
    }
}

impl<'a> IntoIterator for &'a Pool {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Produce `min..=max` as unlabeled entries.
///
/// # Errors
///
/// Returns [`PoolError::InvalidRange`] unless `1 <= min <= max <= 999`.
pub fn build_from_range(min: i64, max: i64) -> Result<Pool, PoolError> {
    let lower = i64::from(MIN_ENTRY_NUMBER);
    let upper = i64::from(MAX_ENTRY_NUMBER);
    if max < lower || max > upper || min < lower || min > max {
        return Err(PoolError::InvalidRange { min, max });
    }
    let (Ok(min), Ok(max)) = (u16::try_from(min), u16::try_from(max)) else {
        return Err(PoolError::InvalidRange { min, max });
    };
    let entries = (min..=max)
        .filter_map(EntryId::from_number)
        .map(|id| Entry::new(id, None))
        .collect();
    Ok(Pool {
        source: PoolSource::Range { min, max },
        entries,
    })
}

/// Number entrants `001..` in input order, keeping display names as labels.
///
/// # Errors
///
/// Returns [`PoolError::TooManyEntries`] when the list exceeds 999 entrants.
pub fn build_from_entries(entrants: &[Entrant]) -> Result<Pool, PoolError> {
    if entrants.len() > usize::from(MAX_ENTRY_NUMBER) {
        return Err(PoolError::TooManyEntries {
            count: entrants.len(),
        });
    }
    let entries = entrants
        .iter()
        .zip(MIN_ENTRY_NUMBER..)
        .filter_map(|(entrant, number)| {
            EntryId::from_number(number)
                .map(|id| Entry::new(id, Some(entrant.display_name.clone())))
        })
        .collect();
    Ok(Pool {
        source: PoolSource::Entrants,
        entries,
    })
}

/// Interpret the operator's range input. Blank or non-numeric text falls back
/// to the default upper bound.
///
/// # Errors
///
/// Returns [`PoolError::InvalidRange`] when a parsed value lies outside `1..=999`.
pub fn parse_range_input(text: &str) -> Result<u16, PoolError> {
    let max = match text.trim().parse::<i64>() {
        Ok(0) | Err(_) => i64::from(DEFAULT_RANGE_MAX),
        Ok(value) => value,
    };
    if !(i64::from(MIN_ENTRY_NUMBER)..=i64::from(MAX_ENTRY_NUMBER)).contains(&max) {
        return Err(PoolError::InvalidRange {
            min: i64::from(MIN_ENTRY_NUMBER),
            max,
        });
    }
    u16::try_from(max).map_err(|_| PoolError::InvalidRange {
        min: i64::from(MIN_ENTRY_NUMBER),
        max,
    })
}
