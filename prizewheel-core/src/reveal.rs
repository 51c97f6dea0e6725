//! Staged digit-by-digit reveal of a drawn code.
//!
//! The machine walks `Hidden -> Hundreds -> Tens -> Units`, one operator step
//! at a time. Each step narrows the visible candidates to entries sharing the
//! revealed prefix; reaching the tens digit also fills the two-bucket
//! candidate display.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::CandidateLimits;
use crate::constants::{CANDIDATE_STAGE, ID_WIDTH};
use crate::draw::{DrawResult, RevealPolicy};
use crate::pool::{Entry, EntryId};
use crate::registry::ContextId;

/// Number of digits disclosed so far.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RevealStage {
    #[default]
    Hidden,
    Hundreds,
    Tens,
    Units,
}

impl RevealStage {
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Hidden => 0,
            Self::Hundreds => 1,
            Self::Tens => 2,
            Self::Units => 3,
        }
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Hidden),
            1 => Some(Self::Hundreds),
            2 => Some(Self::Tens),
            3 => Some(Self::Units),
            _ => None,
        }
    }

    /// Following stage; saturates at `Units`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Hidden => Self::Hundreds,
            Self::Hundreds => Self::Tens,
            Self::Tens | Self::Units => Self::Units,
        }
    }

    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Units)
    }

    /// Caption for the digit place revealed by this stage.
    #[must_use]
    pub const fn place_label(self) -> Option<&'static str> {
        match self {
            Self::Hidden => None,
            Self::Hundreds => Some("hundreds"),
            Self::Tens => Some("tens"),
            Self::Units => Some("units"),
        }
    }

    const fn revealed_len(self) -> usize {
        self.index() as usize
    }
}

/// Narrowed candidates shown beside the wheel once two digits are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CandidateDisplay {
    pub left: SmallVec<[Entry; 5]>,
    pub right: SmallVec<[Entry; 5]>,
    /// Winner, once fully revealed and present in one of the buckets.
    pub highlighted: Option<EntryId>,
}

impl CandidateDisplay {
    fn from_candidates<'a>(
        candidates: impl Iterator<Item = &'a Entry>,
        limits: CandidateLimits,
    ) -> Self {
        let mut display = Self::default();
        for (position, entry) in candidates.take(limits.cap).enumerate() {
            if position < limits.bucket {
                display.left.push(entry.clone());
            } else {
                display.right.push(entry.clone());
            }
        }
        display
    }

    /// All displayed entries, left bucket first.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.left.iter().chain(self.right.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, id: &EntryId) -> bool {
        self.iter().any(|entry| &entry.id == id)
    }

    fn highlight(&mut self, id: &EntryId) {
        if self.contains(id) {
            self.highlighted = Some(id.clone());
        }
    }
}

/// Snapshot of a reveal for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealState {
    pub context: ContextId,
    pub policy: RevealPolicy,
    pub stage: RevealStage,
    pub winner_id: EntryId,
    pub revealed_digits: String,
    /// Wheel text with unrevealed digits masked, e.g. `"31?"`.
    pub masked_code: String,
    /// Eligible entries consistent with the revealed prefix.
    pub candidate_pool: Vec<Entry>,
    pub candidates: Option<CandidateDisplay>,
}

/// Progressive disclosure of one draw's winning code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealStateMachine {
    result: DrawResult,
    policy: RevealPolicy,
    limits: CandidateLimits,
    candidates: Option<CandidateDisplay>,
}

impl RevealStateMachine {
    /// Take ownership of a fresh draw. Instant policy reveals every digit
    /// straight away.
    #[must_use]
    pub fn start(result: DrawResult, policy: RevealPolicy, limits: CandidateLimits) -> Self {
        let mut machine = Self {
            result,
            policy,
            limits,
            candidates: None,
        };
        if !policy.is_staged() {
            machine.reveal_all();
        }
        machine
    }

    #[must_use]
    pub const fn stage(&self) -> RevealStage {
        self.result.stage
    }

    #[must_use]
    pub const fn policy(&self) -> RevealPolicy {
        self.policy
    }

    #[must_use]
    pub const fn result(&self) -> &DrawResult {
        &self.result
    }

    #[must_use]
    pub const fn winner(&self) -> &Entry {
        &self.result.winner
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.result.stage.is_complete()
    }

    #[must_use]
    pub fn revealed_digits(&self) -> &str {
        &self.result.revealed_digits
    }

    #[must_use]
    pub const fn candidate_display(&self) -> Option<&CandidateDisplay> {
        self.candidates.as_ref()
    }

    /// Reveal the next digit. Returns `false` once all digits are shown.
    pub fn advance(&mut self) -> bool {
        let current = self.result.stage;
        if current.is_complete() {
            return false;
        }
        let next = current.next();
        self.result.stage = next;
        self.result.revealed_digits = self
            .result
            .winner
            .id
            .prefix(next.revealed_len())
            .to_string();

        if next.index() == CANDIDATE_STAGE {
            let prefix_len = next.revealed_len();
            let winner = &self.result.winner.id;
            self.candidates = Some(CandidateDisplay::from_candidates(
                self.result
                    .eligible
                    .iter()
                    .filter(|entry| entry.id.shares_prefix(winner, prefix_len)),
                self.limits,
            ));
        }
        if next.is_complete() {
            let winner = self.result.winner.id.clone();
            if let Some(display) = self.candidates.as_mut() {
                display.highlight(&winner);
            }
        }
        log::debug!(
            "reveal in '{}': stage {} shows '{}'",
            self.result.context,
            next.index(),
            self.result.revealed_digits
        );
        true
    }

    /// Advance until every digit is shown.
    pub fn reveal_all(&mut self) {
        while self.advance() {}
    }

    /// Wheel text such as `"3??"`.
    #[must_use]
    pub fn masked_code(&self) -> String {
        let revealed = self.revealed_digits();
        let hidden = ID_WIDTH.saturating_sub(revealed.len());
        format!("{revealed}{}", "?".repeat(hidden))
    }

    /// Eligible entries still consistent with the revealed prefix, in pool order.
    pub fn visible_candidates(&self) -> impl Iterator<Item = &Entry> {
        let prefix_len = self.result.stage.revealed_len();
        let winner = &self.result.winner.id;
        self.result
            .eligible
            .iter()
            .filter(move |entry| entry.id.shares_prefix(winner, prefix_len))
    }

    /// Caption for the most recently revealed digit, e.g. `"tens: 1"`.
    #[must_use]
    pub fn digit_caption(&self) -> Option<String> {
        let stage = self.result.stage;
        let label = stage.place_label()?;
        let digit = self
            .result
            .winner
            .id
            .digit(stage.revealed_len().saturating_sub(1))?;
        Some(format!("{label}: {digit}"))
    }

    #[must_use]
    pub fn snapshot(&self) -> RevealState {
        RevealState {
            context: self.result.context.clone(),
            policy: self.policy,
            stage: self.result.stage,
            winner_id: self.result.winner.id.clone(),
            revealed_digits: self.result.revealed_digits.clone(),
            masked_code: self.masked_code(),
            candidate_pool: self.visible_candidates().cloned().collect(),
            candidates: self.candidates.clone(),
        }
    }

    /// Give back the draw with its final reveal progress.
    #[must_use]
    pub fn into_result(self) -> DrawResult {
        self.result
    }
}
