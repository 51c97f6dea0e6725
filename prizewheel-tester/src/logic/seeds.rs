use anyhow::{Result, bail};
use prizewheel_core::RngBundle;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Seed used when no tokens are supplied.
pub const DEFAULT_SEED: u64 = 1337;

/// Resolved seed plus the token it came from, when that was not a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub label: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, label: None }
    }

    /// Stable seed for a free-form phrase such as a stream title. Case and
    /// surrounding whitespace are ignored.
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        let normalized = phrase.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        let mut bytes = [0_u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self {
            seed: u64::from_le_bytes(bytes),
            label: Some(normalized),
        }
    }

    #[must_use]
    pub fn display(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({label})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into concrete seeds.
///
/// Accepts decimal integers, `0x` hex, the keyword `random`, and bare
/// phrases of letters, digits, `-` or `_`, which are hashed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("random") {
            pending.push(SeedInfo::from_numeric(RngBundle::from_entropy().seed()));
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            match u64::from_str_radix(hex, 16) {
                Ok(value) => {
                    pending.push(SeedInfo::from_numeric(value));
                    continue;
                }
                Err(_) => bail!("Invalid hex seed: {token}"),
            }
        }

        if token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            pending.push(SeedInfo::from_phrase(token));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    for info in pending {
        if let Some(&existing) = index.get(&info.seed) {
            if deduped[existing].label.is_none() && info.label.is_some() {
                deduped[existing] = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}
