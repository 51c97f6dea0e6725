use std::cell::Cell;
use std::convert::Infallible;

use prizewheel_core::{ContextId, ContextKind, Entrant, EntrantSource};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Offline stand-in for the rewards API: every reward has `count` redemptions
/// named `viewer001`, `viewer002`, ...
#[derive(Debug, Default)]
pub struct FixtureEntrants {
    count: Cell<usize>,
    fetches: Cell<usize>,
}

impl FixtureEntrants {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count: Cell::new(count),
            fetches: Cell::new(0),
        }
    }

    /// Simulate new redemptions arriving before the next fetch.
    pub fn grow(&self, by: usize) {
        self.count.set(self.count.get().saturating_add(by));
    }

    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl EntrantSource for FixtureEntrants {
    type Error = Infallible;

    fn fetch_entrants(
        &self,
        _context: &ContextId,
        _kind: &ContextKind,
    ) -> Result<Vec<Entrant>, Self::Error> {
        self.fetches.set(self.fetches.get() + 1);
        Ok((1..=self.count.get())
            .map(|n| Entrant::new(format!("user-{n}"), format!("viewer{n:03}")))
            .collect())
    }
}
