use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::info;

use super::codes::{Generation, GovernmentQueryCode, builtin_current_codes, builtin_legacy_codes};
use crate::core::QueryErrorCode;

/// Errors raised while extending the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("government error code must not be empty")]
    EmptyCode,

    #[error("government error code {code} is flagged retryable but maps to {mapped}, which never is")]
    RetryableMismatch { code: String, mapped: QueryErrorCode },

    #[error("invalid error-code configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Registry key: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Normalize an entry's code and check it can be registered.
fn admit(mut entry: GovernmentQueryCode) -> Result<(String, GovernmentQueryCode), RegistryError> {
    let key = normalize_code(&entry.code);
    if key.is_empty() {
        return Err(RegistryError::EmptyCode);
    }
    // retrying a not-found, permission, certificate or validation failure never helps
    if entry.retryable && !entry.mapped_code.is_retryable() {
        return Err(RegistryError::RetryableMismatch {
            code: key,
            mapped: entry.mapped_code,
        });
    }
    entry.code = key.clone();
    Ok((key, entry))
}

#[derive(Default)]
struct Codesets {
    current: HashMap<String, GovernmentQueryCode>,
    legacy: HashMap<String, GovernmentQueryCode>,
}

impl Codesets {
    fn insert(&mut self, key: String, entry: GovernmentQueryCode) {
        // a code lives in exactly one generation
        let (target, other) = match entry.generation {
            Generation::Current => (&mut self.current, &mut self.legacy),
            Generation::Legacy => (&mut self.legacy, &mut self.current),
        };
        other.remove(&key);
        target.insert(key, entry);
    }
}

/// Known government error codes of both generations.
///
/// Readers never block each other; a registration excludes all other
/// access for the duration of the insert. Entries handed out are clones.
pub struct CodeRegistry {
    codes: RwLock<Codesets>,
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl CodeRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self {
            codes: RwLock::new(Codesets::default()),
        }
    }

    /// A registry seeded with every built-in code of both generations.
    pub fn with_builtin() -> Self {
        let mut sets = Codesets::default();
        for entry in builtin_current_codes().into_iter().chain(builtin_legacy_codes()) {
            sets.insert(normalize_code(&entry.code), entry);
        }
        Self {
            codes: RwLock::new(sets),
        }
    }

    /// Look a code up, newer generation first.
    pub fn get(&self, code: &str) -> Option<GovernmentQueryCode> {
        let key = normalize_code(code);
        let sets = self.codes.read();
        sets.current
            .get(&key)
            .or_else(|| sets.legacy.get(&key))
            .cloned()
    }

    /// Add or replace an entry in the generation it declares.
    pub fn register(&self, entry: GovernmentQueryCode) -> Result<(), RegistryError> {
        let (key, entry) = admit(entry)?;
        info!(
            code = %key,
            generation = ?entry.generation,
            mapped = %entry.mapped_code,
            "registering government error code"
        );
        self.codes.write().insert(key, entry);
        Ok(())
    }

    /// Register every entry of a JSON array of [`GovernmentQueryCode`]s.
    ///
    /// The whole document is checked before anything is inserted, and all
    /// entries land under a single write lock. Returns the number registered.
    pub fn extend_from_json(&self, json: &str) -> Result<usize, RegistryError> {
        let entries: Vec<GovernmentQueryCode> = serde_json::from_str(json)?;
        let keyed = entries
            .into_iter()
            .map(admit)
            .collect::<Result<Vec<_>, _>>()?;

        let count = keyed.len();
        let mut sets = self.codes.write();
        for (key, entry) in keyed {
            sets.insert(key, entry);
        }
        info!(count, "registered government error codes from configuration");
        Ok(count)
    }

    /// Snapshot of every entry, sorted by code.
    pub fn list(&self) -> Vec<GovernmentQueryCode> {
        let sets = self.codes.read();
        let mut all: Vec<_> = sets
            .current
            .values()
            .chain(sets.legacy.values())
            .cloned()
            .collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    pub fn len(&self) -> usize {
        let sets = self.codes.read();
        sets.current.len() + sets.legacy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
