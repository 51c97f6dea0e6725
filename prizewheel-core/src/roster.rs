//! Cross-context list of announced winners.
//!
//! The roster mirrors finalized reward draws for the operator. It is display
//! state only: removing a record never makes an entry eligible again.
use serde::{Deserialize, Serialize};

use crate::pool::EntryId;

/// Roster row identifier, unique for the lifetime of a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub id: RecordId,
    pub reward_name: String,
    pub entry_id: EntryId,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnersRoster {
    records: Vec<WinnerRecord>,
    next_id: u64,
}

impl WinnersRoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a winner unless the same reward/entry pair is already listed.
    pub fn add(
        &mut self,
        reward_name: &str,
        entry_id: &EntryId,
        display_name: Option<&str>,
    ) -> Option<RecordId> {
        let duplicate = self
            .records
            .iter()
            .any(|record| record.reward_name == reward_name && &record.entry_id == entry_id);
        if duplicate {
            return None;
        }
        let id = RecordId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.records.push(WinnerRecord {
            id,
            reward_name: reward_name.to_string(),
            entry_id: entry_id.clone(),
            display_name: display_name.map(str::to_string),
        });
        Some(id)
    }

    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        before != self.records.len()
    }

    /// Drop every record; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    #[must_use]
    pub fn records(&self) -> &[WinnerRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
