//! Alias generation library
//!
//! Deterministic alias-name synthesis from themed word bundles, secret
//! synthesis from the OS random source, and the classifier used to tell
//! generated aliases apart from hand-made ones.

pub mod rng;
pub mod themes;
pub mod names;
pub mod secrets;
pub mod classifier;

// Re-export main types
pub use rng::SeededRng;
pub use themes::{WordBundle, builtin_bundles, find_bundle, theme_keys};
pub use names::{MAX_NAME_ATTEMPTS, NameSynthesizer, generate_batch};
pub use secrets::{DEFAULT_SECRET_LENGTH, MAX_SECRET_RETRIES, MIN_SECRET_LENGTH, SecretSynthesizer, covers_all_classes};
pub use classifier::{Classifier, is_generated};
