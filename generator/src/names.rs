//! Alias identifier synthesis from a word bundle and a seeded stream

use std::collections::HashSet;

use shared::{SharedError, SharedResult};

use crate::rng::SeededRng;
use crate::themes::WordBundle;

/// Draws allowed per identifier before giving up on finding an unused one
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Produces `prefix.suffix` identifiers unique within one batch
#[derive(Debug)]
pub struct NameSynthesizer<'a> {
    bundle: &'a WordBundle,
    rng: SeededRng,
    used: HashSet<String>,
}

impl<'a> NameSynthesizer<'a> {
    pub fn new(bundle: &'a WordBundle, seed: u32) -> Self {
        Self {
            bundle,
            rng: SeededRng::new(seed),
            used: HashSet::new(),
        }
    }

    /// Treat `identifiers` as already taken in this batch
    pub fn with_used<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used.extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn used(&self) -> &HashSet<String> {
        &self.used
    }

    /// Next identifier not yet in the used-set; records it as used
    pub fn next_name(&mut self) -> SharedResult<String> {
        draw_unique(self.bundle, &mut self.rng, &mut self.used)
    }

    /// Generate `count` identifiers in draw order
    pub fn generate(&mut self, count: usize) -> SharedResult<Vec<String>> {
        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            names.push(self.next_name()?);
        }
        Ok(names)
    }
}

/// One identifier from `bundle` that is not in `used`, inserted on success.
///
/// Prefix and suffix are drawn independently with replacement, so single
/// words repeat across identifiers; only the combined string is unique.
fn draw_unique(bundle: &WordBundle, rng: &mut SeededRng, used: &mut HashSet<String>) -> SharedResult<String> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let prefix = &bundle.prefixes()[rng.next_index(bundle.prefixes().len())];
        let suffix = &bundle.suffixes()[rng.next_index(bundle.suffixes().len())];
        let candidate = format!("{prefix}.{suffix}");
        if used.insert(candidate.clone()) {
            return Ok(candidate);
        }
        tracing::trace!(candidate = %candidate, "name collision, redrawing");
    }
    Err(SharedError::capacity(
        format!("unique names for theme '{}' ({} used)", bundle.key(), used.len()),
        MAX_NAME_ATTEMPTS,
    ))
}

/// Reproducible batch: the same (bundle, seed, count) always yields the same list
pub fn generate_batch(bundle: &WordBundle, seed: u32, count: usize) -> SharedResult<Vec<String>> {
    NameSynthesizer::new(bundle, seed).generate(count)
}
