//! # nfse-nacional
//!
//! Document identity validation and government error normalization for the
//! Brazilian national electronic service invoice (NFS-e, Ambiente Nacional).
//!
//! Everything runs before or after a call to the government backend: access
//! keys and DPS identifiers are checked against their grammars, DPS
//! documents against a structural subset of the national schema, signed XML
//! is parsed into typed records, and SEFIN error codes are translated into
//! one retry-aware taxonomy. Cryptography is delegated to a
//! [`CertificateParser`] / [`SignatureVerifier`] supplied by the caller.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use nfse_nacional::*;
//!
//! assert!(is_valid_access_key("NFSe35503081234567800019900001000000000000001abcde"));
//!
//! let id: DpsId = "355030811234567800019900001000000000000001".parse().unwrap();
//! assert_eq!(id.registration_type, RegistrationType::Cnpj);
//! assert_eq!(id.cnpj(), Some("12345678000199"));
//!
//! let err = NfseError::from(validate_access_key("NFSe123").unwrap_err());
//! assert_eq!(err.code(), "INVALID_ACCESS_KEY");
//! assert_eq!(err.http_status(), 400);
//! assert!(!err.is_retryable());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Identifier grammars, error taxonomy, domain records |
//! | `xml` | XSD-lite validator, NFS-e and pre-signed DPS parsers |
//! | `sefin` | Government error-code registry and translator |
//! | `certificate` | Certificate admission gate |
//! | `all` | Everything |
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod dps;

#[cfg(feature = "sefin")]
pub mod sefin;

#[cfg(feature = "certificate")]
pub mod certificate;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
