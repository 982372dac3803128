/// Reporting rules: ignore patterns and type classification.
pub mod classify;
pub mod ignore;

pub use classify::{reference_override, AssetClassifier, BuildRoots, Classification, Verdict};
pub use ignore::{IgnoreRules, DEFAULT_IGNORE_PATTERNS, PATTERNS_KEY};
