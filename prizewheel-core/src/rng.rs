//! Random sources for winner selection and wheel flicker.
//!
//! Selection is uniform but not cryptographic. Streams are derived from one
//! user seed so a session can be replayed, and the draw engine only talks to
//! the [`SelectionSource`] trait so tests can script outcomes.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;

use crate::constants::{STREAM_SELECTION, STREAM_SPIN};

/// Anything able to pick an index uniformly from `0..len`.
pub trait SelectionSource {
    /// Pick an index in `0..len`. Callers never pass `len == 0`.
    fn pick_index(&mut self, len: usize) -> usize;
}

impl<S: SelectionSource + ?Sized> SelectionSource for &mut S {
    fn pick_index(&mut self, len: usize) -> usize {
        (**self).pick_index(len)
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

impl<R: RngCore> SelectionSource for CountingRng<R> {
    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.gen_range(0..len)
    }
}

/// Seeded RNG streams segregated by purpose.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    selection: CountingRng<SmallRng>,
    spin: CountingRng<SmallRng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            selection: CountingRng::new(derive_stream_seed(seed, STREAM_SELECTION)),
            spin: CountingRng::new(derive_stream_seed(seed, STREAM_SPIN)),
        }
    }

    /// Seed the bundle from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::random())
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used to choose winners.
    pub fn selection(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.selection
    }

    /// Stream used for the cosmetic spin sequence.
    pub fn spin(&mut self) -> &mut CountingRng<SmallRng> {
        &mut self.spin
    }
}

/// Replays a fixed list of picks, cycling when exhausted. Out-of-range picks
/// wrap modulo `len`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPicks {
    picks: Vec<usize>,
    cursor: usize,
}

impl ScriptedPicks {
    #[must_use]
    pub fn new(picks: impl Into<Vec<usize>>) -> Self {
        Self {
            picks: picks.into(),
            cursor: 0,
        }
    }

    /// Number of picks consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl SelectionSource for ScriptedPicks {
    fn pick_index(&mut self, len: usize) -> usize {
        if self.picks.is_empty() || len == 0 {
            return 0;
        }
        let pick = self.picks[self.cursor % self.picks.len()];
        self.cursor = self.cursor.saturating_add(1);
        pick % len
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed ^ u64::from_le_bytes(pad_tag(domain_tag));
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

fn pad_tag(tag: &[u8]) -> [u8; 8] {
    let mut bytes = [0_u8; 8];
    for (slot, byte) in bytes.iter_mut().zip(tag) {
        *slot = *byte;
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_deterministic_per_seed() {
        let mut a = RngBundle::from_user_seed(1337);
        let mut b = RngBundle::from_user_seed(1337);
        let picks_a: Vec<usize> = (0..20).map(|_| a.selection().pick_index(999)).collect();
        let picks_b: Vec<usize> = (0..20).map(|_| b.selection().pick_index(999)).collect();
        assert_eq!(picks_a, picks_b);
        assert_eq!(a.selection().draws(), b.selection().draws());
    }

    #[test]
    fn selection_and_spin_streams_differ() {
        assert_ne!(
            derive_stream_seed(7, STREAM_SELECTION),
            derive_stream_seed(7, STREAM_SPIN)
        );
    }

    #[test]
    fn picks_stay_in_bounds() {
        let mut bundle = RngBundle::from_user_seed(99);
        for len in 1..50 {
            for _ in 0..25 {
                assert!(bundle.selection().pick_index(len) < len);
            }
        }
        assert_eq!(bundle.selection().pick_index(1), 0);
    }

    #[test]
    fn scripted_picks_cycle_and_wrap() {
        let mut picks = ScriptedPicks::new(vec![1, 7]);
        assert_eq!(picks.pick_index(5), 1);
        assert_eq!(picks.pick_index(5), 2);
        assert_eq!(picks.pick_index(5), 1);
        assert_eq!(picks.consumed(), 3);
        assert_eq!(ScriptedPicks::default().pick_index(4), 0);
    }
}
