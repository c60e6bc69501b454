//! Option resolution and `${...}` token replacement
//!
//! Option keys are dot-qualified (`torque.jdbc2schema.url`-style).
//! A unit-level store resolves its own overrides first and falls back to
//! the parent configuration only when the unit is declared as inheriting.

use std::collections::HashMap;

use crate::error::GeneratorError;

/// Name-to-value lookup with a two-level fallback chain
#[derive(Debug, Clone)]
pub struct OptionStore {
    /// Unit-specific overrides
    unit: HashMap<String, String>,
    /// Parent/default configuration
    parent: HashMap<String, String>,
    /// Whether unresolved keys fall back to the parent configuration
    inherits: bool,
}

impl OptionStore {
    /// Create an empty, inheriting store
    pub fn new() -> Self {
        Self {
            unit: HashMap::new(),
            parent: HashMap::new(),
            inherits: true,
        }
    }

    /// Control whether lookups fall back to the parent configuration
    pub fn inheriting(mut self, inherits: bool) -> Self {
        self.inherits = inherits;
        self
    }

    /// Set a unit-level override
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.unit.insert(key.into(), value.into());
    }

    /// Set a parent/default value
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parent.insert(key.into(), value.into());
    }

    /// Resolve a qualified key, override first, parent second
    pub fn get_option(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.unit.get(key) {
            return Some(value);
        }
        if self.inherits {
            return self.parent.get(key).map(String::as_str);
        }
        None
    }

    /// Resolve a qualified key that is required to be set
    pub fn get_string_option(&self, key: &str) -> Result<&str, GeneratorError> {
        self.get_option(key)
            .ok_or_else(|| GeneratorError::OptionNotSet(key.to_string()))
    }
}

impl Default for OptionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `${key}` placeholders in an action parameter
///
/// Substitution is textual and runs once per action execution: a value
/// that itself contains `${` is not re-scanned. An unresolvable key is a
/// fatal error naming the key, so configuration typos surface instead of
/// leaking literals into generated output.
pub fn replace_tokens(input: &str, options: &OptionStore) -> Result<String, GeneratorError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| GeneratorError::UnterminatedToken(input.to_string()))?;
        let key = &after[..end];
        out.push_str(options.get_string_option(key)?);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
