/// User-editable exclusion patterns.
///
/// A path is excluded from the report when any non-empty pattern matches
/// it anywhere (unanchored `Regex::is_match`, not a full-string match).
/// Patterns are persisted through a [`SettingsStore`] as a count under
/// [`PATTERNS_KEY`] followed by `{PATTERNS_KEY}_{i}` entries.
use crate::error::{HuntError, Result};
use crate::settings::SettingsStore;
use regex::Regex;
use tracing::warn;

/// Base settings key for the persisted pattern list.
pub const PATTERNS_KEY: &str = "RefHuntIgnorePatterns";

/// Upper bound on the number of patterns read from a store.
pub const MAX_PATTERNS: usize = 1_024;

/// Common non-content locations and metadata-only file types.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "/Resources/",
    "/Editor/",
    "/Editor Default Resources/",
    "/ThirdParty/",
    "ProjectSettings/",
    "Packages/",
    r"\.asmdef$",
    r"link\.xml$",
    r"\.csv$",
    r"\.md$",
    r"\.json$",
    r"\.xml$",
    r"\.txt$",
];

fn slot_key(index: usize) -> String {
    format!("{PATTERNS_KEY}_{index}")
}

/// Compile one pattern. Empty patterns compile to `None` without error.
fn compile(index: usize, pattern: &str) -> Result<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|e| HuntError::InvalidPattern {
            index,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// The current ignore-pattern list with its compiled matchers.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    /// `None` for empty or invalid patterns; both match nothing.
    compiled: Vec<Option<Regex>>,
    dirty: bool,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl IgnoreRules {
    /// Rules from an explicit list. Invalid patterns are kept but inert.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rules = Self {
            patterns: Vec::new(),
            compiled: Vec::new(),
            dirty: false,
        };
        for pattern in patterns {
            // Invalid entries are already logged by `push`.
            let _ = rules.push(pattern);
        }
        rules.dirty = false;
        rules
    }

    /// No patterns at all: every path is allowed.
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_IGNORE_PATTERNS.iter().copied())
    }

    /// Load from the store. Falls back to the defaults when nothing was ever saved.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let count = store.get_int(PATTERNS_KEY, -1);
        if count < 0 {
            return Self::with_defaults();
        }
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        if count > MAX_PATTERNS {
            warn!("Stored pattern count {count} exceeds {MAX_PATTERNS}; loading the first {MAX_PATTERNS}");
        }
        let count = count.min(MAX_PATTERNS);
        Self::new((0..count).map(|i| store.get_string(&slot_key(i))))
    }

    /// Persist every pattern and clear the dirty flag.
    pub fn save(&mut self, store: &dyn SettingsStore) -> Result<()> {
        store.set_int(PATTERNS_KEY, self.patterns.len() as i64)?;
        for (i, pattern) in self.patterns.iter().enumerate() {
            store.set_string(&slot_key(i), pattern)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Persist only if something changed since the last load/save.
    pub fn save_if_dirty(&mut self, store: &dyn SettingsStore) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.save(store)?;
        Ok(true)
    }

    /// Replace the list with [`DEFAULT_IGNORE_PATTERNS`].
    pub fn set_defaults(&mut self) {
        *self = Self::with_defaults();
        self.dirty = true;
    }

    /// Edit one pattern in place.
    ///
    /// Returns `Ok(true)` when the value changed and `Ok(false)` when it was
    /// identical or `index` is out of range. An invalid regex is still
    /// stored, so editing can continue, but it excludes nothing and the
    /// error is returned.
    pub fn set_pattern(&mut self, index: usize, value: &str) -> Result<bool> {
        let Some(current) = self.patterns.get(index) else {
            return Ok(false);
        };
        if current == value {
            return Ok(false);
        }
        self.patterns[index] = value.to_string();
        self.dirty = true;
        match compile(index, value) {
            Ok(regex) => {
                self.compiled[index] = regex;
                Ok(true)
            }
            Err(e) => {
                warn!("{e}; the pattern is skipped");
                self.compiled[index] = None;
                Err(e)
            }
        }
    }

    /// Append a pattern. Same validation rules as [`set_pattern`](Self::set_pattern).
    pub fn push(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let index = self.patterns.len();
        let compiled = compile(index, &value);
        self.patterns.push(value);
        self.dirty = true;
        match compiled {
            Ok(regex) => {
                self.compiled.push(regex);
                Ok(())
            }
            Err(e) => {
                warn!("{e}; the pattern is skipped");
                self.compiled.push(None);
                Err(e)
            }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.patterns.len() {
            return None;
        }
        self.compiled.remove(index);
        self.dirty = true;
        Some(self.patterns.remove(index))
    }

    /// Change the list length. Shrinking drops trailing patterns; growing
    /// refills new slots from whatever the store last persisted there.
    pub fn resize(&mut self, len: usize, store: &dyn SettingsStore) {
        let len = len.min(MAX_PATTERNS);
        if len == self.patterns.len() {
            return;
        }
        if len < self.patterns.len() {
            self.patterns.truncate(len);
            self.compiled.truncate(len);
            self.dirty = true;
            return;
        }
        for i in self.patterns.len()..len {
            let _ = self.push(store.get_string(&slot_key(i)));
        }
    }

    /// `true` iff no non-empty, valid pattern matches anywhere in `path`.
    pub fn is_allowed(&self, path: &str) -> bool {
        self.first_match(path).is_none()
    }

    /// The first pattern that excludes `path`, if any.
    pub fn first_match(&self, path: &str) -> Option<&str> {
        self.compiled
            .iter()
            .zip(&self.patterns)
            .find(|(regex, _)| matches!(regex, Some(r) if r.is_match(path)))
            .map(|(_, pattern)| pattern.as_str())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Plain-text listing, one pattern per line, for copying.
    pub fn describe(&self) -> String {
        self.patterns
            .iter()
            .fold(String::from("Patterns:"), |mut out, p| {
                out.push('\n');
                out.push_str(p);
                out
            })
    }
}
