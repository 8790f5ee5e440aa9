//! String format registry
//!
//! Maps a `format` name to a predicate over strings. The standard table is
//! built once per process and never mutated; callers wanting different
//! formats build their own [`FormatRegistry`] and hand it to
//! [`ValidationOptions::with_formats`](crate::options::ValidationOptions::with_formats).
//!
//! ## Standard formats
//! `email`, `ip-address`, `ipv6`, `date-time`, `date`, `time`, `color`,
//! `host-name`, `utc-millisec`, `regex`, and the non-standard `url` and `slug`.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SchemaError};

/// How a single format is recognised
#[derive(Clone)]
enum Matcher {
    Regex(Regex),
    Predicate(fn(&str) -> bool),
}

impl Matcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(value),
            Matcher::Predicate(check) => check(value),
        }
    }
}

/// Immutable name → predicate table
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<String, Matcher>,
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.formats.keys().collect();
        names.sort();
        f.debug_struct("FormatRegistry").field("formats", &names).finish()
    }
}

impl FormatRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard format table
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (name, pattern) in STANDARD_PATTERNS {
            let re = Regex::new(pattern).expect("built-in format patterns compile");
            registry.formats.insert(name.to_string(), Matcher::Regex(re));
        }
        registry
            .formats
            .insert("regex".to_string(), Matcher::Predicate(is_valid_regex));
        registry
    }

    /// Add or replace a regex-backed format
    pub fn with_pattern(mut self, name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let re = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
            path: format!("format:{}", name),
            source,
        })?;
        self.formats.insert(name, Matcher::Regex(re));
        Ok(self)
    }

    /// Add or replace a predicate-backed format
    pub fn with_predicate(mut self, name: impl Into<String>, check: fn(&str) -> bool) -> Self {
        self.formats.insert(name.into(), Matcher::Predicate(check));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// `None` when the format is unknown
    pub fn check(&self, name: &str, value: &str) -> Option<bool> {
        self.formats.get(name).map(|m| m.matches(value))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.formats.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The process-wide standard registry
pub fn standard_registry() -> &'static FormatRegistry {
    static STANDARD: OnceLock<FormatRegistry> = OnceLock::new();
    STANDARD.get_or_init(FormatRegistry::standard)
}

/// Whether the standard registry knows `name`
pub fn has_format(name: &str) -> bool {
    standard_registry().contains(name)
}

/// Whether `value` matches standard format `name`; unknown formats never match
pub fn matches_format(name: &str, value: &str) -> bool {
    standard_registry().check(name, value).unwrap_or(false)
}

fn is_valid_regex(value: &str) -> bool {
    Regex::new(value).is_ok()
}

const STANDARD_PATTERNS: &[(&str, &str)] = &[
    (
        "email",
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([a-z0-9]([a-z0-9_~-]*[a-z0-9])?\.)+[a-z]([a-z0-9_~-]*[a-z])?\.?$",
    ),
    (
        "ip-address",
        r"^(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$",
    ),
    ("ipv6", r"^([0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}$"),
    ("date-time", r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,3})?Z$"),
    ("date", r"^\d{4}-\d{2}-\d{2}$"),
    ("time", r"^\d{2}:\d{2}:\d{2}$"),
    (
        "color",
        r"(?i)^#[a-z0-9]{6}$|^#[a-z0-9]{3}$|^rgba?\(\s*[+-]?\d+%?\s*,\s*[+-]?\d+%?\s*,\s*[+-]?\d+%?\s*(,\s*[+-]?\d+%?\s*)?\)$",
    ),
    (
        "host-name",
        r"^(([a-zA-Z]|[a-zA-Z][a-zA-Z0-9-]*[a-zA-Z0-9])\.)*([A-Za-z]|[A-Za-z][A-Za-z0-9-]*[A-Za-z0-9])$",
    ),
    ("utc-millisec", r"^\d+$"),
    (
        "url",
        r"^(http|ftp|https)://[\w-]+(\.[\w-]+)+([\w.,@?^=%&:/~+#-]*[\w@?^=%&/~+#-])?$",
    ),
    ("slug", r"^([a-zA-Z]|[a-zA-Z][a-zA-Z0-9-]*[a-zA-Z0-9])*$"),
];
