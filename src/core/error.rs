use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::access_key::AccessKeyError;
use super::dps_id::DpsIdError;
use super::query::QueryError;

/// Errors surfaced by the validation and normalization pipeline.
///
/// Every variant maps to a stable machine-readable code, an HTTP status and
/// a retryability flag so the HTTP layer and the retry policy never need to
/// inspect message text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NfseError {
    /// The access key failed its grammar.
    #[error("invalid access key: {0}")]
    AccessKey(#[from] AccessKeyError),

    /// The DPS identifier failed its grammar.
    #[error("invalid DPS identifier: {0}")]
    DpsId(#[from] DpsIdError),

    /// The DPS document failed structural validation.
    #[error("document failed structural validation with {} violation(s)", .0.len())]
    Document(Vec<SchemaViolation>),

    /// The XML could not be turned into a domain record.
    #[error("XML error: {0}")]
    Xml(#[from] XmlParseError),

    /// A pre-signed document failed its semantic checks.
    #[error("pre-signed document rejected with {} problem(s)", .0.len())]
    Submission(Vec<ValidationError>),

    /// The signature verifier rejected the document signature.
    #[error("signature verification failed: {}", .0.join("; "))]
    InvalidSignature(Vec<String>),

    /// The certificate admission gate rejected the certificate.
    #[error("certificate rejected with {} problem(s)", .0.len())]
    Certificate(Vec<ValidationError>),

    /// A query-level error, usually translated from the government backend.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl NfseError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccessKey(_) => "INVALID_ACCESS_KEY",
            Self::DpsId(_) => "INVALID_DPS_ID",
            Self::Document(_) => "XSD_VALIDATION_FAILED",
            Self::Xml(_) => "INVALID_XML_FORMAT",
            Self::Submission(_) => "PRESIGNED_VALIDATION_FAILED",
            Self::InvalidSignature(_) => "SIGNATURE_INVALID",
            Self::Certificate(errors) => {
                if !errors.is_empty() && errors.iter().all(|e| e.code == "required") {
                    "CERTIFICATE_REQUIRED"
                } else {
                    "CERTIFICATE_INVALID"
                }
            }
            Self::Query(e) => e.code.as_str(),
        }
    }

    /// HTTP status the surrounding API layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Query(e) => e.http_status(),
            _ => 400,
        }
    }

    /// Whether retrying the same request can succeed.
    ///
    /// Only availability and timeout failures reported by the government
    /// backend are retryable; every local validation failure is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Query(e) => e.retryable,
            _ => false,
        }
    }

    /// Structured per-field sub-errors for multi-field failures.
    pub fn field_errors(&self) -> Vec<ValidationError> {
        match self {
            Self::Document(violations) => violations.iter().map(ValidationError::from).collect(),
            Self::Submission(errors) | Self::Certificate(errors) => errors.clone(),
            Self::InvalidSignature(reasons) => reasons
                .iter()
                .map(|r| ValidationError::new("xml.signature", "signature_invalid", r.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A single field-level error with a stable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dot-separated path to the offending field (e.g. "certificate.password").
    pub field: String,
    /// Machine-readable code (e.g. "required", "CERTIFICATE_EXPIRED").
    pub code: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&SchemaViolation> for ValidationError {
    fn from(v: &SchemaViolation) -> Self {
        Self::new(v.element.clone(), v.code.as_str(), v.message.clone())
    }
}

/// Kind of structural violation found in a DPS document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    MissingElement,
    InvalidNamespace,
    InvalidValue,
    InvalidFormat,
    InvalidDataType,
    MissingAttribute,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingElement => "MISSING_ELEMENT",
            Self::InvalidNamespace => "INVALID_NAMESPACE",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidDataType => "INVALID_DATA_TYPE",
            Self::MissingAttribute => "MISSING_ATTRIBUTE",
        }
    }
}

/// One structural violation: where, what, and the raw offending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub code: ViolationCode,
    /// Element path such as `infDPS/serv/cTribNac`.
    pub element: String,
    pub message: String,
    /// The value exactly as found in the document, never coerced.
    pub value: Option<String>,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(v) => write!(
                f,
                "{} [{}]: {} (value: {})",
                self.code.as_str(),
                self.element,
                self.message,
                v
            ),
            None => write!(f, "{} [{}]: {}", self.code.as_str(), self.element, self.message),
        }
    }
}

/// Failure turning XML text into a typed record.
///
/// Each failure mode is its own variant so callers can render precise
/// guidance instead of a generic "parse failed".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum XmlParseError {
    #[error("XML content cannot be empty")]
    Empty,

    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("expected root element '{expected}', found '{found}'")]
    MissingRoot {
        expected: &'static str,
        found: String,
    },

    #[error("required element '{0}' not found")]
    MissingWrapper(&'static str),

    #[error("required attribute 'Id' not found on '{0}'")]
    MissingIdAttribute(&'static str),

    #[error("provider (prest) information not found")]
    MissingProvider,

    #[error("provider CNPJ or CPF not found")]
    MissingProviderId,

    #[error("element '{element}' is not a valid decimal: '{value}'")]
    InvalidDecimal {
        element: &'static str,
        value: String,
    },

    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),
}

impl XmlParseError {
    /// Stable machine-readable code for this failure mode.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY_XML",
            Self::Malformed(_) => "MALFORMED_XML",
            Self::MissingRoot { .. } => "MISSING_ROOT",
            Self::MissingWrapper(_) => "MISSING_WRAPPER",
            Self::MissingIdAttribute(_) => "MISSING_ID_ATTRIBUTE",
            Self::MissingProvider => "MISSING_PROVIDER",
            Self::MissingProviderId => "MISSING_PROVIDER_ID",
            Self::InvalidDecimal { .. } => "INVALID_DECIMAL",
            Self::InvalidBase64(_) => "INVALID_BASE64",
        }
    }
}
