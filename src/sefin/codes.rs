use serde::{Deserialize, Serialize};

use crate::core::{FormattedQueryError, QueryErrorCode};

/// Classification of a government error code for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    QueryValidation,
    NotFound,
    Permission,
    Certificate,
    Service,
    Unknown,
}

impl QueryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueryValidation => "query_validation",
            Self::NotFound => "not_found",
            Self::Permission => "permission",
            Self::Certificate => "certificate",
            Self::Service => "service",
            Self::Unknown => "unknown",
        }
    }

    /// Category implied by an internal code.
    pub fn of(code: QueryErrorCode) -> Self {
        match code {
            QueryErrorCode::InvalidAccessKey | QueryErrorCode::InvalidDpsId => {
                Self::QueryValidation
            }
            QueryErrorCode::NfseNotFound | QueryErrorCode::DpsNotFound => Self::NotFound,
            QueryErrorCode::ForbiddenAccess => Self::Permission,
            QueryErrorCode::CertificateRequired | QueryErrorCode::CertificateInvalid => {
                Self::Certificate
            }
            QueryErrorCode::GovernmentUnavailable | QueryErrorCode::GovernmentTimeout => {
                Self::Service
            }
        }
    }

    /// Category of a newer-generation code (`Q` + three digits) by its
    /// numeric band, whether or not the code is registered.
    ///
    /// | Band | Category |
    /// |------|----------|
    /// | 001–019 | validation |
    /// | 020–039 | not found |
    /// | 040–059 | permission |
    /// | 060–079 | certificate |
    /// | 100–119 | service |
    pub fn from_band(normalized_code: &str) -> Option<Self> {
        let digits = normalized_code.strip_prefix('Q')?;
        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match digits.parse::<u16>().ok()? {
            1..=19 => Some(Self::QueryValidation),
            20..=39 => Some(Self::NotFound),
            40..=59 => Some(Self::Permission),
            60..=79 => Some(Self::Certificate),
            100..=119 => Some(Self::Service),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the government's two code vocabularies an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// Banded `Qnnn` codes.
    #[default]
    Current,
    /// Alphanumeric `Ennn` codes still sent by older endpoints.
    Legacy,
}

/// One known government error code and its internal mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernmentQueryCode {
    pub code: String,
    /// Original Portuguese message.
    pub message: String,
    pub description: String,
    /// What the integrator should do about it.
    pub action: String,
    pub category: QueryCategory,
    pub retryable: bool,
    pub mapped_code: QueryErrorCode,
    #[serde(default)]
    pub generation: Generation,
}

impl GovernmentQueryCode {
    pub fn format_for_api(&self) -> FormattedQueryError {
        FormattedQueryError::from(self)
    }
}

impl From<&GovernmentQueryCode> for FormattedQueryError {
    fn from(g: &GovernmentQueryCode) -> Self {
        Self {
            code: g.mapped_code.as_str().to_string(),
            title: g.message.clone(),
            description: g.description.clone(),
            action: g.action.clone(),
            retryable: g.retryable,
            government_code: Some(g.code.clone()),
        }
    }
}

fn current(
    code: &str,
    message: &str,
    description: &str,
    action: &str,
    mapped_code: QueryErrorCode,
) -> GovernmentQueryCode {
    GovernmentQueryCode {
        code: code.to_string(),
        message: message.to_string(),
        description: description.to_string(),
        action: action.to_string(),
        category: QueryCategory::from_band(code).unwrap_or(QueryCategory::Unknown),
        retryable: mapped_code.is_retryable(),
        mapped_code,
        generation: Generation::Current,
    }
}

fn legacy(code: &str, message: &str, mapped_code: QueryErrorCode) -> GovernmentQueryCode {
    GovernmentQueryCode {
        code: code.to_string(),
        message: message.to_string(),
        description: message.to_string(),
        action: String::new(),
        category: QueryCategory::of(mapped_code),
        retryable: mapped_code.is_retryable(),
        mapped_code,
        generation: Generation::Legacy,
    }
}

/// Built-in newer-generation codes.
pub fn builtin_current_codes() -> Vec<GovernmentQueryCode> {
    use QueryErrorCode::*;
    vec![
        // Validation
        current(
            "Q001",
            "Chave de acesso invalida",
            "Invalid NFS-e access key format",
            "Verify the access key format: must be 50 alphanumeric characters starting with 'NFSe'",
            InvalidAccessKey,
        ),
        current(
            "Q002",
            "Id DPS invalido",
            "Invalid DPS identifier format",
            "Verify the DPS ID format: must be 42 numeric characters",
            InvalidDpsId,
        ),
        current(
            "Q003",
            "Parametros de consulta invalidos",
            "Invalid query parameters provided",
            "Check the query parameters format and values",
            InvalidAccessKey,
        ),
        // Not found
        current(
            "Q020",
            "NFS-e nao encontrada",
            "The requested NFS-e was not found in the national system",
            "Verify the access key is correct. The NFS-e may not exist or may have been cancelled",
            NfseNotFound,
        ),
        current(
            "Q021",
            "DPS nao encontrado",
            "The requested DPS was not found in the national system",
            "Verify the DPS ID is correct. The DPS may not exist or may not have been processed yet",
            DpsNotFound,
        ),
        current(
            "Q022",
            "Evento nao encontrado",
            "No events found for the specified NFS-e",
            "The NFS-e may not have any registered events, or the access key may be incorrect",
            NfseNotFound,
        ),
        current(
            "Q023",
            "NFS-e cancelada",
            "The NFS-e has been cancelled and is no longer valid",
            "This NFS-e was cancelled. Query events to see cancellation details",
            NfseNotFound,
        ),
        // Permission
        current(
            "Q040",
            "Acesso negado",
            "Access denied to the requested resource",
            "Verify your credentials and permissions. You may only query NFS-e documents you are authorized to access",
            ForbiddenAccess,
        ),
        current(
            "Q041",
            "Prestador nao autorizado",
            "Provider not authorized to query this NFS-e",
            "You can only query NFS-e documents where you are the provider or an authorized third party",
            ForbiddenAccess,
        ),
        current(
            "Q042",
            "Tomador nao autorizado",
            "Taker not authorized to query this NFS-e",
            "You can only query NFS-e documents where you are the taker or an authorized third party",
            ForbiddenAccess,
        ),
        // Certificate
        current(
            "Q060",
            "Certificado obrigatorio",
            "A digital certificate is required for this query operation",
            "Provide a valid ICP-Brasil digital certificate to authenticate the request",
            CertificateRequired,
        ),
        current(
            "Q061",
            "Certificado invalido",
            "The provided digital certificate is invalid",
            "Check the certificate format, expiration date, and ensure it is from an ICP-Brasil authority",
            CertificateInvalid,
        ),
        current(
            "Q062",
            "Certificado expirado",
            "The digital certificate has expired",
            "Renew your digital certificate. A1 certificates are valid for 1 year",
            CertificateInvalid,
        ),
        current(
            "Q063",
            "Certificado revogado",
            "The digital certificate has been revoked",
            "Obtain a new certificate from an ICP-Brasil certificate authority",
            CertificateInvalid,
        ),
        current(
            "Q064",
            "CNPJ do certificado nao confere",
            "Certificate CNPJ does not match the requester",
            "Use a certificate that belongs to the CNPJ making the query request",
            CertificateInvalid,
        ),
        // Service availability
        current(
            "Q100",
            "Servico temporariamente indisponivel",
            "Government query service is temporarily unavailable",
            "Wait and retry the query. Check government portal for maintenance notices",
            GovernmentUnavailable,
        ),
        current(
            "Q101",
            "Timeout na consulta",
            "Query request timed out",
            "The query may still be processing. Wait before retrying to avoid duplicate requests",
            GovernmentTimeout,
        ),
        current(
            "Q102",
            "Sistema em manutencao",
            "Government system is under scheduled maintenance",
            "Check the government portal for maintenance window and expected restoration time",
            GovernmentUnavailable,
        ),
        current(
            "Q103",
            "Erro interno do sistema",
            "Internal government system error during query",
            "Wait and retry. If persistent, contact government support",
            GovernmentUnavailable,
        ),
        current(
            "Q104",
            "Limite de requisicoes excedido",
            "Query rate limit exceeded",
            "Reduce query frequency. Implement exponential backoff between requests",
            GovernmentUnavailable,
        ),
    ]
}

/// Built-in legacy codes.
pub fn builtin_legacy_codes() -> Vec<GovernmentQueryCode> {
    use QueryErrorCode::*;
    vec![
        legacy("E001", "Invalid data provided", InvalidAccessKey),
        legacy("E002", "Resource not found", NfseNotFound),
        legacy("E003", "Access denied", ForbiddenAccess),
        legacy("E004", "Service unavailable", GovernmentUnavailable),
    ]
}
