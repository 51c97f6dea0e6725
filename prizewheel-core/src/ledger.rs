//! Per-context record of drawn winners.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pool::{Entry, EntryId, Pool};
use crate::registry::ContextId;

/// Drawn ids per context, kept in draw order.
///
/// Membership decides eligibility under continuous mode; order is what the
/// "drawn" list displays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerLedger {
    drawn: HashMap<ContextId, Vec<EntryId>>,
}

impl WinnerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a winner. Re-recording is a no-op; returns whether the id was new.
    pub fn record(&mut self, context: &ContextId, id: &EntryId) -> bool {
        let drawn = self.drawn.entry(context.clone()).or_default();
        if drawn.contains(id) {
            return false;
        }
        drawn.push(id.clone());
        true
    }

    #[must_use]
    pub fn is_drawn(&self, context: &ContextId, id: &EntryId) -> bool {
        self.drawn
            .get(context)
            .is_some_and(|drawn| drawn.contains(id))
    }

    /// Pool entries not yet drawn, in pool order.
    #[must_use]
    pub fn remaining(&self, context: &ContextId, pool: &Pool) -> Vec<Entry> {
        pool.iter()
            .filter(|entry| !self.is_drawn(context, &entry.id))
            .cloned()
            .collect()
    }

    /// Count of undrawn pool entries without cloning them.
    #[must_use]
    pub fn remaining_count(&self, context: &ContextId, pool: &Pool) -> usize {
        pool.iter()
            .filter(|entry| !self.is_drawn(context, &entry.id))
            .count()
    }

    /// Drawn ids for a context in draw order.
    #[must_use]
    pub fn drawn(&self, context: &ContextId) -> &[EntryId] {
        self.drawn.get(context).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn drawn_count(&self, context: &ContextId) -> usize {
        self.drawn(context).len()
    }

    pub fn reset(&mut self, context: &ContextId) {
        self.drawn.remove(context);
    }

    /// Un-draw a single id; returns whether it had been recorded.
    pub fn remove_one(&mut self, context: &ContextId, id: &EntryId) -> bool {
        let Some(drawn) = self.drawn.get_mut(context) else {
            return false;
        };
        let before = drawn.len();
        drawn.retain(|existing| existing != id);
        before != drawn.len()
    }
}
