//! Certificate admission gate.
//!
//! Cheap checks on a base64 PFX blob and its password run before the
//! cryptographic collaborator is ever called; the collaborator's failures
//! are then re-classified into stable certificate error codes.
//!
//! ```
//! use nfse_nacional::certificate::{CertificateGate, CertificateRequest};
//! use nfse_nacional::{CertificateParser, ParseFailure, SigningFailure};
//!
//! struct Unreachable;
//! impl CertificateParser for Unreachable {
//!     type Info = ();
//!     fn parse_certificate(&self, _: &str, _: &str) -> Result<(), ParseFailure> {
//!         unreachable!("empty blobs never reach the parser")
//!     }
//!     fn validate_for_signing(&self, _: &()) -> Result<(), Vec<SigningFailure>> {
//!         Ok(())
//!     }
//! }
//!
//! let gate = CertificateGate::new(Unreachable);
//! let result = gate.check(&CertificateRequest::new("", "secret"));
//! assert!(!result.valid);
//! assert_eq!(result.errors[0].code, "required");
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{CertificateParser, NfseError, ParseFailure, SigningFailure, ValidationError};

/// Lower-case fragments that mark an untyped parse failure as a password problem.
pub const PASSWORD_FAILURE_KEYWORDS: [&str; 3] = ["password", "mac", "decrypt"];

const FIELD_BLOB: &str = "certificate.pfx_base64";
const FIELD_PASSWORD: &str = "certificate.password";
const FIELD_CERTIFICATE: &str = "certificate";

/// Stable codes for certificate admission failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateErrorCode {
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "INVALID_CERTIFICATE_BASE64")]
    InvalidBase64,
    #[serde(rename = "INVALID_CERTIFICATE_FORMAT")]
    InvalidFormat,
    #[serde(rename = "INVALID_CERTIFICATE_PASSWORD")]
    InvalidPassword,
    #[serde(rename = "CERTIFICATE_MISSING_KEY")]
    MissingKey,
    #[serde(rename = "CERTIFICATE_EXPIRED")]
    Expired,
    #[serde(rename = "CERTIFICATE_NOT_YET_VALID")]
    NotYetValid,
    #[serde(rename = "CERTIFICATE_INVALID_KEY_USAGE")]
    InvalidKeyUsage,
}

impl CertificateErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidBase64 => "INVALID_CERTIFICATE_BASE64",
            Self::InvalidFormat => "INVALID_CERTIFICATE_FORMAT",
            Self::InvalidPassword => "INVALID_CERTIFICATE_PASSWORD",
            Self::MissingKey => "CERTIFICATE_MISSING_KEY",
            Self::Expired => "CERTIFICATE_EXPIRED",
            Self::NotYetValid => "CERTIFICATE_NOT_YET_VALID",
            Self::InvalidKeyUsage => "CERTIFICATE_INVALID_KEY_USAGE",
        }
    }
}

fn error(field: &str, code: CertificateErrorCode, message: impl Into<String>) -> ValidationError {
    ValidationError::new(field, code.as_str(), message)
}

/// A base64 PFX blob and its password.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub pfx_base64: String,
    pub password: String,
}

impl CertificateRequest {
    pub fn new(pfx_base64: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            pfx_base64: pfx_base64.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for CertificateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateRequest")
            .field("pfx_base64", &format_args!("<{} bytes>", self.pfx_base64.len()))
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of admitting a certificate.
///
/// `certificate` is only set when every check passed, so callers can sign
/// with it without parsing the blob again.
#[derive(Debug, Clone)]
pub struct CertificateValidationResult<I> {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub certificate: Option<I>,
}

impl<I> CertificateValidationResult<I> {
    fn rejected(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
            certificate: None,
        }
    }

    /// The parsed certificate, or every recorded problem as one error.
    pub fn into_result(self) -> Result<I, NfseError> {
        match self.certificate {
            Some(info) if self.valid => Ok(info),
            _ => Err(NfseError::Certificate(self.errors)),
        }
    }
}

/// Whether an untyped parse failure message points at a wrong password.
///
/// Case-insensitive substring matching over [`PASSWORD_FAILURE_KEYWORDS`]. Only
/// consulted for [`ParseFailure::InvalidFormat`]; a collaborator that can
/// tell the cases apart should return [`ParseFailure::IncorrectPassword`].
// TODO: drop once every CertificateParser reports IncorrectPassword itself.
pub fn looks_like_password_failure(message: &str) -> bool {
    let message = message.to_lowercase();
    PASSWORD_FAILURE_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

fn classify_parse_failure(failure: &ParseFailure) -> ValidationError {
    use CertificateErrorCode::*;
    match failure {
        ParseFailure::InvalidBase64 => error(
            FIELD_BLOB,
            InvalidBase64,
            "Certificate PFX data is not valid base64 encoding",
        ),
        ParseFailure::IncorrectPassword => error(
            FIELD_BLOB,
            InvalidPassword,
            "Invalid certificate password or corrupted PFX file",
        ),
        ParseFailure::InvalidFormat(msg) if looks_like_password_failure(msg) => error(
            FIELD_BLOB,
            InvalidPassword,
            "Invalid certificate password or corrupted PFX file",
        ),
        ParseFailure::MissingPrivateKey => error(
            FIELD_BLOB,
            MissingKey,
            "Certificate PFX file does not contain a private key",
        ),
        other => error(
            FIELD_BLOB,
            InvalidFormat,
            format!("Failed to parse certificate: {other}"),
        ),
    }
}

fn classify_signing_failure(failure: &SigningFailure) -> ValidationError {
    let code = match failure {
        SigningFailure::Expired => CertificateErrorCode::Expired,
        SigningFailure::NotYetValid => CertificateErrorCode::NotYetValid,
        SigningFailure::MissingPrivateKey => CertificateErrorCode::MissingKey,
        SigningFailure::InvalidKeyUsage => CertificateErrorCode::InvalidKeyUsage,
        SigningFailure::Other(_) => {
            return error(
                FIELD_CERTIFICATE,
                CertificateErrorCode::InvalidFormat,
                failure.to_string(),
            );
        }
    };
    error(FIELD_BLOB, code, failure.to_string())
}

/// Admits certificates through a [`CertificateParser`].
pub struct CertificateGate<P> {
    parser: P,
}

impl<P: CertificateParser> CertificateGate<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Run every admission check in order, stopping at the first failing stage.
    pub fn check(&self, request: &CertificateRequest) -> CertificateValidationResult<P::Info> {
        use CertificateErrorCode::*;

        if request.pfx_base64.trim().is_empty() {
            return CertificateValidationResult::rejected(vec![error(
                FIELD_BLOB,
                Required,
                "Certificate PFX (base64 encoded) is required",
            )]);
        }
        if request.password.is_empty() {
            return CertificateValidationResult::rejected(vec![error(
                FIELD_PASSWORD,
                Required,
                "Certificate password is required",
            )]);
        }
        if STANDARD.decode(request.pfx_base64.trim()).is_err() {
            return CertificateValidationResult::rejected(vec![error(
                FIELD_BLOB,
                InvalidBase64,
                "Certificate PFX data is not valid base64 encoding",
            )]);
        }

        let info = match self
            .parser
            .parse_certificate(request.pfx_base64.trim(), &request.password)
        {
            Ok(info) => info,
            Err(failure) => {
                let err = classify_parse_failure(&failure);
                debug!(code = %err.code, "certificate parse failed");
                return CertificateValidationResult::rejected(vec![err]);
            }
        };

        if let Err(failures) = self.parser.validate_for_signing(&info) {
            let mut errors: Vec<_> = failures.iter().map(classify_signing_failure).collect();
            if errors.is_empty() {
                errors.push(error(
                    FIELD_CERTIFICATE,
                    InvalidFormat,
                    "certificate cannot be used for signing",
                ));
            }
            debug!(problems = errors.len(), "certificate rejected for signing");
            return CertificateValidationResult::rejected(errors);
        }

        debug!("certificate admitted");
        CertificateValidationResult {
            valid: true,
            errors: Vec::new(),
            certificate: Some(info),
        }
    }
}
