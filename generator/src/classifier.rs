//! Heuristic check for whether an address looks machine-generated
//!
//! An address counts as generated when its local part is exactly
//! `prefix.suffix`, the prefix appears in some bundle's prefix list and the
//! suffix in some bundle's suffix list (not necessarily the same bundle).
//! A hand-made address that happens to fit the pattern is misclassified;
//! callers must offer a dry run or confirmation before deleting on this basis.

use std::collections::HashSet;

use crate::themes::{WordBundle, builtin_bundles};

/// Membership index over the prefix and suffix lists of a set of bundles
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    prefixes: HashSet<String>,
    suffixes: HashSet<String>,
}

impl Classifier {
    pub fn new<'a, I>(bundles: I) -> Self
    where
        I: IntoIterator<Item = &'a WordBundle>,
    {
        let mut classifier = Self::default();
        for bundle in bundles {
            classifier.prefixes.extend(bundle.prefixes().iter().cloned());
            classifier.suffixes.extend(bundle.suffixes().iter().cloned());
        }
        classifier
    }

    /// Classifier over every built-in bundle
    pub fn builtin() -> Self {
        Self::new(builtin_bundles())
    }

    pub fn is_generated(&self, address: &str) -> bool {
        let Some((local, domain)) = address.trim().split_once('@') else {
            return false;
        };
        if domain.is_empty() {
            return false;
        }

        let local = local.to_lowercase();
        let mut segments = local.split('.');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(prefix), Some(suffix), None) => self.prefixes.contains(prefix) && self.suffixes.contains(suffix),
            _ => false,
        }
    }
}

/// One-shot classification against an explicit bundle set
pub fn is_generated(address: &str, bundles: &[WordBundle]) -> bool {
    Classifier::new(bundles).is_generated(address)
}
