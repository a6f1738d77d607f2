//! Themed word bundles used to synthesize alias identifiers

use std::sync::LazyLock;

use shared::{SharedError, SharedResult};

/// A named pair of word lists; identifiers are `prefix.suffix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBundle {
    key: String,
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl WordBundle {
    /// Build a bundle, rejecting empty lists and tokens that could break the
    /// `prefix.suffix@domain` shape
    pub fn new<P, S>(key: &str, prefixes: P, suffixes: S) -> SharedResult<Self>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        let suffixes: Vec<String> = suffixes.into_iter().map(Into::into).collect();

        if key.trim().is_empty() {
            return Err(SharedError::invalid("theme", key, "theme key is empty"));
        }
        if prefixes.is_empty() {
            return Err(SharedError::invalid("prefixes", key, "prefix list is empty"));
        }
        if suffixes.is_empty() {
            return Err(SharedError::invalid("suffixes", key, "suffix list is empty"));
        }
        if let Some(bad) = prefixes.iter().chain(suffixes.iter()).find(|t| !is_valid_token(t)) {
            return Err(SharedError::invalid(
                "token",
                bad,
                "tokens must be non-empty lowercase words without '.', '@' or whitespace",
            ));
        }

        Ok(Self {
            key: key.to_string(),
            prefixes,
            suffixes,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Number of distinct `prefix.suffix` identifiers this bundle can form
    pub fn capacity(&self) -> usize {
        self.prefixes.len() * self.suffixes.len()
    }
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && !token.contains(['.', '@'])
        && !token.chars().any(char::is_whitespace)
        && token.chars().all(|c| !c.is_uppercase())
}

static PRIVACY_GUARDIAN: (&[&str], &[&str]) = (
    &[
        "silent", "hidden", "quiet", "secure", "shadow", "stealth", "masked", "veiled", "private", "covert",
        "guarded", "cloaked", "discreet", "anonymous", "phantom", "shielded", "sealed", "locked", "obscure",
        "muted",
    ],
    &[
        "shield", "guardian", "sentinel", "keeper", "vault", "fortress", "warden", "bastion", "cipher", "aegis",
        "watcher", "haven", "lock", "ward", "cloak", "barrier", "citadel", "bulwark", "veil", "refuge",
    ],
);

static NATURE_EXPLORER: (&[&str], &[&str]) = (
    &[
        "misty", "mossy", "wild", "sunny", "amber", "cedar", "willow", "river", "meadow", "autumn", "frosty",
        "golden", "rocky", "verdant", "breezy", "coastal", "alpine", "dusky", "gentle", "rustic",
    ],
    &[
        "fern", "falcon", "brook", "grove", "ridge", "heron", "pine", "canyon", "lark", "otter", "badger",
        "glade", "summit", "thicket", "hollow", "marsh", "aspen", "boulder", "trail", "cove",
    ],
);

static COSMIC_VOYAGER: (&[&str], &[&str]) = (
    &[
        "stellar", "lunar", "solar", "cosmic", "astral", "orbital", "nebular", "galactic", "radiant", "quantum",
        "celestial", "polar", "crimson", "distant", "infinite", "ionic", "blazing", "drifting", "frozen",
        "spinning",
    ],
    &[
        "comet", "nova", "pulsar", "quasar", "orbit", "meteor", "nebula", "galaxy", "rocket", "voyager", "probe",
        "zenith", "eclipse", "aurora", "photon", "vector", "horizon", "satellite", "cosmos", "beacon",
    ],
);

static URBAN_NOMAD: (&[&str], &[&str]) = (
    &[
        "neon", "urban", "midnight", "electric", "concrete", "steel", "rapid", "metro", "velvet", "chrome",
        "copper", "restless", "vivid", "lofty", "wandering", "downtown", "gritty", "rooftop", "transit", "brisk",
    ],
    &[
        "nomad", "rider", "courier", "drifter", "runner", "pilot", "walker", "skater", "commuter", "rover",
        "tram", "alley", "avenue", "plaza", "loft", "station", "signal", "bridge", "tower", "market",
    ],
);

static MYTHIC_REALM: (&[&str], &[&str]) = (
    &[
        "ancient", "mystic", "arcane", "elder", "fabled", "runic", "enchanted", "gilded", "iron", "noble",
        "storm", "ember", "feral", "hallowed", "eternal", "twilight", "valiant", "sacred", "spectral", "wyrd",
    ],
    &[
        "griffin", "phoenix", "wyvern", "titan", "oracle", "druid", "knight", "rune", "golem", "hydra", "sphinx",
        "kraken", "seer", "paladin", "warlock", "chimera", "basilisk", "unicorn", "minotaur", "valkyrie",
    ],
);

static BUILTIN: LazyLock<Vec<WordBundle>> = LazyLock::new(|| {
    [
        ("privacy-guardian", PRIVACY_GUARDIAN),
        ("nature-explorer", NATURE_EXPLORER),
        ("cosmic-voyager", COSMIC_VOYAGER),
        ("urban-nomad", URBAN_NOMAD),
        ("mythic-realm", MYTHIC_REALM),
    ]
    .into_iter()
    .filter_map(|(key, (prefixes, suffixes))| {
        WordBundle::new(key, prefixes.iter().copied(), suffixes.iter().copied()).ok()
    })
    .collect()
});

/// All built-in bundles, in a stable order
pub fn builtin_bundles() -> &'static [WordBundle] {
    &BUILTIN
}

/// Look up a built-in bundle by theme key (case-insensitive)
pub fn find_bundle(key: &str) -> Option<&'static WordBundle> {
    let wanted = key.trim().to_lowercase();
    BUILTIN.iter().find(|bundle| bundle.key == wanted)
}

pub fn theme_keys() -> Vec<&'static str> {
    BUILTIN.iter().map(|bundle| bundle.key.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bundles_are_valid() {
        // filter_map would silently drop an invalid built-in
        assert_eq!(builtin_bundles().len(), 5);
        for bundle in builtin_bundles() {
            assert!(!bundle.prefixes().is_empty());
            assert!(!bundle.suffixes().is_empty());
            assert_eq!(bundle.capacity(), bundle.prefixes().len() * bundle.suffixes().len());
        }
    }

    #[test]
    fn test_find_bundle() {
        let bundle = find_bundle("privacy-guardian").unwrap();
        assert_eq!(bundle.key(), "privacy-guardian");
        assert!(find_bundle("  Privacy-Guardian ").is_some());
        assert!(find_bundle("no-such-theme").is_none());
    }

    #[test]
    fn test_theme_keys_order() {
        let keys = theme_keys();
        assert_eq!(keys.first(), Some(&"privacy-guardian"));
        assert!(keys.contains(&"mythic-realm"));
    }

    #[test]
    fn test_rejects_bad_tokens() {
        assert!(WordBundle::new("t", ["a.b"], ["c"]).is_err());
        assert!(WordBundle::new("t", ["a"], ["c@d"]).is_err());
        assert!(WordBundle::new("t", ["Upper"], ["c"]).is_err());
        assert!(WordBundle::new("t", ["two words"], ["c"]).is_err());
        assert!(WordBundle::new("t", Vec::<String>::new(), ["c"]).is_err());
        assert!(WordBundle::new("t", ["a"], Vec::<String>::new()).is_err());
        assert!(WordBundle::new(" ", ["a"], ["b"]).is_err());
        assert!(WordBundle::new("t", ["a"], ["b"]).is_ok());
    }
}
