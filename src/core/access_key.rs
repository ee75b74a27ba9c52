//! NFS-e access key (chave de acesso) grammar.
//!
//! An access key is exactly 50 ASCII alphanumeric characters starting with
//! the literal prefix `NFSe`. Surrounding whitespace is ignored; the body is
//! case-sensitive.

use thiserror::Error;

/// Length of a well-formed access key.
pub const ACCESS_KEY_LENGTH: usize = 50;
/// Literal prefix every access key starts with.
pub const ACCESS_KEY_PREFIX: &str = "NFSe";

/// Why an access key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessKeyError {
    #[error("access key is required")]
    Empty,

    #[error("access key must be {ACCESS_KEY_LENGTH} characters, got {0} characters")]
    WrongLength(usize),

    #[error("access key must start with '{ACCESS_KEY_PREFIX}', got '{0}'")]
    WrongPrefix(String),

    #[error("access key must contain only alphanumeric characters")]
    NonAlphanumeric,
}

/// A validated access key split into its prefix and body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessKeyInfo {
    pub prefix: String,
    pub body: String,
}

impl std::fmt::Display for AccessKeyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix, self.body)
    }
}

impl std::str::FromStr for AccessKeyInfo {
    type Err = AccessKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_access_key(s)
    }
}

/// Check an access key, reporting the first failing rule.
///
/// Rules are checked in a fixed order: presence, length, prefix, then
/// character class. Length is measured in characters, so multi-byte input
/// is reported with its character count and never split mid-codepoint.
pub fn validate_access_key(key: &str) -> Result<(), AccessKeyError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AccessKeyError::Empty);
    }

    let len = key.chars().count();
    if len != ACCESS_KEY_LENGTH {
        return Err(AccessKeyError::WrongLength(len));
    }

    let prefix: String = key.chars().take(ACCESS_KEY_PREFIX.len()).collect();
    if prefix != ACCESS_KEY_PREFIX {
        return Err(AccessKeyError::WrongPrefix(prefix));
    }

    if !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AccessKeyError::NonAlphanumeric);
    }

    Ok(())
}

/// Boolean form of [`validate_access_key`].
pub fn is_valid_access_key(key: &str) -> bool {
    validate_access_key(key).is_ok()
}

/// Trim surrounding whitespace and validate. Case is preserved.
pub fn normalize_access_key(key: &str) -> Result<String, AccessKeyError> {
    let key = key.trim();
    validate_access_key(key)?;
    Ok(key.to_string())
}

/// Validate and split an access key into prefix and body.
pub fn parse_access_key(key: &str) -> Result<AccessKeyInfo, AccessKeyError> {
    validate_access_key(key)?;
    let key = key.trim();
    // validated as ASCII above, so byte slicing is on a char boundary
    let (prefix, body) = key.split_at(ACCESS_KEY_PREFIX.len());
    Ok(AccessKeyInfo {
        prefix: prefix.to_string(),
        body: body.to_string(),
    })
}
