use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::access_key::AccessKeyError;
use super::dps_id::DpsIdError;

/// Closed set of query error kinds exposed to API clients.
///
/// Each kind has exactly one HTTP status and one retryability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryErrorCode {
    InvalidAccessKey,
    #[serde(rename = "INVALID_DPS_ID")]
    InvalidDpsId,
    #[serde(rename = "NFSE_NOT_FOUND")]
    NfseNotFound,
    #[serde(rename = "DPS_NOT_FOUND")]
    DpsNotFound,
    ForbiddenAccess,
    CertificateRequired,
    CertificateInvalid,
    GovernmentUnavailable,
    GovernmentTimeout,
}

impl QueryErrorCode {
    pub const ALL: [Self; 9] = [
        Self::InvalidAccessKey,
        Self::InvalidDpsId,
        Self::NfseNotFound,
        Self::DpsNotFound,
        Self::ForbiddenAccess,
        Self::CertificateRequired,
        Self::CertificateInvalid,
        Self::GovernmentUnavailable,
        Self::GovernmentTimeout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidAccessKey => "INVALID_ACCESS_KEY",
            Self::InvalidDpsId => "INVALID_DPS_ID",
            Self::NfseNotFound => "NFSE_NOT_FOUND",
            Self::DpsNotFound => "DPS_NOT_FOUND",
            Self::ForbiddenAccess => "FORBIDDEN_ACCESS",
            Self::CertificateRequired => "CERTIFICATE_REQUIRED",
            Self::CertificateInvalid => "CERTIFICATE_INVALID",
            Self::GovernmentUnavailable => "GOVERNMENT_UNAVAILABLE",
            Self::GovernmentTimeout => "GOVERNMENT_TIMEOUT",
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidAccessKey
            | Self::InvalidDpsId
            | Self::CertificateRequired
            | Self::CertificateInvalid => 400,
            Self::ForbiddenAccess => 403,
            Self::NfseNotFound | Self::DpsNotFound => 404,
            Self::GovernmentUnavailable => 503,
            Self::GovernmentTimeout => 504,
        }
    }

    /// Static retryability of the kind, consumed by the async retry policy.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::GovernmentUnavailable | Self::GovernmentTimeout)
    }

    /// Default client-facing message for the kind.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::InvalidAccessKey => "Invalid access key format",
            Self::InvalidDpsId => "Invalid DPS identifier format",
            Self::NfseNotFound => "NFS-e not found",
            Self::DpsNotFound => "DPS not found",
            Self::ForbiddenAccess => "Access to this resource is forbidden",
            Self::CertificateRequired => "Digital certificate is required for this operation",
            Self::CertificateInvalid => "Provided digital certificate is invalid or expired",
            Self::GovernmentUnavailable => "Government service is temporarily unavailable",
            Self::GovernmentTimeout => "Government service request timed out",
        }
    }
}

impl std::fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured query error.
///
/// Two errors are equal when their codes are equal, whatever the message,
/// so callers can match on kind alone.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{}", self.render())]
pub struct QueryError {
    pub code: QueryErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Original government error code, when the error came from SEFIN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_code: Option<String>,
    pub retryable: bool,
}

impl PartialEq for QueryError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for QueryError {}

impl QueryError {
    /// Error of the given kind with its default message.
    pub fn new(code: QueryErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    pub fn with_message(code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            government_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Error carrying the provenance of a government response.
    pub fn from_government(
        code: QueryErrorCode,
        government_code: impl Into<String>,
        original_message: impl Into<String>,
    ) -> Self {
        Self {
            government_code: Some(government_code.into()),
            ..Self::with_message(code, original_message)
        }
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    fn render(&self) -> String {
        match &self.detail {
            Some(d) => format!("{}: {} ({})", self.code, self.message, d),
            None => format!("{}: {}", self.code, self.message),
        }
    }
}

impl From<AccessKeyError> for QueryError {
    fn from(e: AccessKeyError) -> Self {
        QueryError::new(QueryErrorCode::InvalidAccessKey).with_detail(e.to_string())
    }
}

impl From<DpsIdError> for QueryError {
    fn from(e: DpsIdError) -> Self {
        QueryError::new(QueryErrorCode::InvalidDpsId).with_detail(e.to_string())
    }
}

/// Flat projection of an error for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedQueryError {
    pub code: String,
    pub title: String,
    pub description: String,
    pub action: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government_code: Option<String>,
}

impl From<&QueryError> for FormattedQueryError {
    fn from(e: &QueryError) -> Self {
        Self {
            code: e.code.as_str().to_string(),
            title: e.message.clone(),
            description: e.detail.clone().unwrap_or_default(),
            action: String::new(),
            retryable: e.retryable,
            government_code: e.government_code.clone(),
        }
    }
}
