//! Secret synthesis for alias credentials
//!
//! Secrets come from the operating system's random source, never from
//! [`crate::rng::SeededRng`], so a known seed reveals nothing about them.

use std::collections::HashSet;

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};

use shared::{CredentialPair, SharedError, SharedResult};

pub const MIN_SECRET_LENGTH: usize = 8;
pub const DEFAULT_SECRET_LENGTH: usize = 12;

/// Redraws allowed per secret when it collides with one already in the batch
pub const MAX_SECRET_RETRIES: u32 = 100;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
// no ':' (flat-list separator), no quotes, no comma
const SYMBOLS: &[u8] = b"!#$%&*+-=?@^_~";

const CLASSES: [&[u8]; 4] = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS];

/// Generates fixed-length secrets covering all four character classes
#[derive(Debug, Clone)]
pub struct SecretSynthesizer {
    length: usize,
}

impl SecretSynthesizer {
    pub fn new(length: usize) -> SharedResult<Self> {
        if length < MIN_SECRET_LENGTH {
            return Err(SharedError::invalid(
                "length",
                length,
                format!("secrets must be at least {MIN_SECRET_LENGTH} characters"),
            ));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// One secret from the OS random source
    pub fn generate(&self) -> String {
        self.generate_with(&mut OsRng)
    }

    /// One secret from `rng`: one character per class, the rest from the
    /// union, then shuffled so class position is unpredictable
    pub fn generate_with<R: RngCore + CryptoRng>(&self, rng: &mut R) -> String {
        let alphabet: Vec<u8> = CLASSES.concat();
        let mut chars: Vec<u8> = Vec::with_capacity(self.length);

        for class in CLASSES {
            chars.push(class[rng.gen_range(0..class.len())]);
        }
        while chars.len() < self.length {
            chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
        }
        chars.shuffle(rng);

        chars.into_iter().map(char::from).collect()
    }

    /// `count` secrets, pairwise distinct
    pub fn generate_unique(&self, count: usize) -> SharedResult<Vec<String>> {
        self.generate_unique_with(count, &mut OsRng)
    }

    pub fn generate_unique_with<R: RngCore + CryptoRng>(&self, count: usize, rng: &mut R) -> SharedResult<Vec<String>> {
        let mut seen = HashSet::with_capacity(count);
        let mut secrets = Vec::with_capacity(count);
        for _ in 0..count {
            let secret = self.draw_distinct(rng, &mut seen)?;
            secrets.push(secret);
        }
        Ok(secrets)
    }

    /// Pair each address with its own distinct secret
    pub fn credentials_for<I, S>(&self, addresses: I) -> SharedResult<Vec<CredentialPair>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses: Vec<String> = addresses.into_iter().map(Into::into).collect();
        let secrets = self.generate_unique(addresses.len())?;
        Ok(addresses
            .into_iter()
            .zip(secrets)
            .map(|(address, password)| CredentialPair::new(address, password))
            .collect())
    }

    fn draw_distinct<R: RngCore + CryptoRng>(&self, rng: &mut R, seen: &mut HashSet<String>) -> SharedResult<String> {
        // first draw plus MAX_SECRET_RETRIES redraws
        for _ in 0..=MAX_SECRET_RETRIES {
            let secret = self.generate_with(rng);
            if seen.insert(secret.clone()) {
                return Ok(secret);
            }
        }
        Err(SharedError::capacity(
            format!("distinct secrets of length {}", self.length),
            MAX_SECRET_RETRIES,
        ))
    }
}

impl Default for SecretSynthesizer {
    fn default() -> Self {
        Self {
            length: DEFAULT_SECRET_LENGTH,
        }
    }
}

/// Does `secret` contain at least one character of every class?
pub fn covers_all_classes(secret: &str) -> bool {
    CLASSES
        .iter()
        .all(|class| secret.bytes().any(|b| class.contains(&b)))
}
