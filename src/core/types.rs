use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Government environment an XML document targets (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// `tpAmb = 1`.
    Production,
    /// `tpAmb = 2`.
    Homologation,
}

impl Environment {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Production),
            2 => Some(Self::Homologation),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Production => 1,
            Self::Homologation => 2,
        }
    }

    /// Portuguese name used by the national API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "producao",
            Self::Homologation => "homologacao",
        }
    }
}

/// Lifecycle status of an issued NFS-e.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NfseStatus {
    #[default]
    Active,
    Cancelled,
    Substituted,
}

impl NfseStatus {
    /// Map a raw `sit` code. Both the short and the three-digit forms are known.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" | "100" => Some(Self::Active),
            "2" | "101" => Some(Self::Cancelled),
            "3" | "102" => Some(Self::Substituted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Substituted => "substituted",
        }
    }
}

/// Kind of document identifying the service taker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerDocumentKind {
    Cnpj,
    Cpf,
    /// Foreign tax id (Número de Identificação Fiscal).
    Nif,
}

/// Issued NFS-e, as returned by the national backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfseData {
    pub access_key: String,
    pub number: String,
    pub issued_at: Option<DateTime<FixedOffset>>,
    pub status: NfseStatus,
    /// `sit` exactly as found in the document, empty when absent.
    pub raw_status: String,
    pub provider: ProviderData,
    pub taker: Option<TakerData>,
    pub service: ServiceData,
    pub values: ValuesData,
}

/// Service provider (emitente).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderData {
    pub document: String,
    pub name: String,
    pub municipality: String,
    pub municipality_code: String,
}

/// Service taker (tomador).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerData {
    pub document: String,
    pub document_kind: TakerDocumentKind,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceData {
    /// National taxation code (cTribNac).
    pub national_code: String,
    pub description: String,
    /// `"<city> - <UF>"`, or just the city when the state is absent.
    pub location: String,
    pub municipality_code: String,
}

/// Monetary values. Rate and tax amount are absent for exempt services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesData {
    pub service_value: Decimal,
    pub tax_base: Decimal,
    pub rate: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub net_value: Decimal,
}

impl NfseData {
    /// Project into the client-facing query response.
    pub fn to_query_response(&self, xml: &str) -> NfseQueryResponse {
        let positive = |v: Option<Decimal>| v.filter(|d| *d > Decimal::ZERO);
        NfseQueryResponse {
            access_key: self.access_key.clone(),
            number: self.number.clone(),
            issued_at: self
                .issued_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, false))
                .unwrap_or_default(),
            status: self.status,
            provider: ProviderInfo {
                document: self.provider.document.clone(),
                name: self.provider.name.clone(),
                municipality: self.provider.municipality.clone(),
            },
            taker: self.taker.as_ref().map(|t| TakerInfo {
                document: (!t.document.is_empty()).then(|| t.document.clone()),
                name: t.name.clone(),
            }),
            service: ServiceInfo {
                national_code: self.service.national_code.clone(),
                description: self.service.description.clone(),
                location: self.service.location.clone(),
            },
            values: ValuesInfo {
                service_value: self.values.service_value,
                tax_base: self.values.tax_base,
                rate: positive(self.values.rate),
                tax_amount: positive(self.values.tax_amount),
                net_value: self.values.net_value,
            },
            xml: xml.to_string(),
        }
    }
}

/// NFS-e query response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfseQueryResponse {
    #[serde(rename = "chave_acesso")]
    pub access_key: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "data_emissao")]
    pub issued_at: String,
    pub status: NfseStatus,
    #[serde(rename = "prestador")]
    pub provider: ProviderInfo,
    #[serde(rename = "tomador", skip_serializing_if = "Option::is_none")]
    pub taker: Option<TakerInfo>,
    #[serde(rename = "servico")]
    pub service: ServiceInfo,
    #[serde(rename = "valores")]
    pub values: ValuesInfo,
    pub xml: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    #[serde(rename = "documento")]
    pub document: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "municipio")]
    pub municipality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerInfo {
    #[serde(rename = "documento", skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(rename = "codigo_nacional")]
    pub national_code: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "local_prestacao")]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuesInfo {
    #[serde(rename = "valor_servico")]
    pub service_value: Decimal,
    #[serde(rename = "base_calculo")]
    pub tax_base: Decimal,
    #[serde(rename = "aliquota", skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    #[serde(rename = "valor_issqn", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,
    #[serde(rename = "valor_liquido")]
    pub net_value: Decimal,
}

/// Fields extracted from a DPS the client signed themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSignedInfo {
    pub dps_id: String,
    /// Digits only.
    pub provider_cnpj: Option<String>,
    /// Digits only.
    pub provider_cpf: Option<String>,
    pub provider_name: String,
    pub municipality_code: String,
    pub series: String,
    pub number: String,
    pub service_value: Option<Decimal>,
    /// Raw `tpAmb`, when it was numeric.
    pub environment_code: Option<u32>,
    pub issued_at: Option<DateTime<FixedOffset>>,
    pub national_service_code: String,
    pub service_description: String,
    pub service_municipality_code: String,
    /// Whether `DPS/Signature` is present. Says nothing about validity.
    pub has_signature: bool,
}

impl PreSignedInfo {
    /// CNPJ when present, otherwise CPF.
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_cnpj.as_deref().or(self.provider_cpf.as_deref())
    }

    pub fn environment(&self) -> Option<Environment> {
        self.environment_code.and_then(Environment::from_code)
    }

    /// Semantic checks a signed document must pass before submission.
    /// Returns all problems found (not just the first).
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.dps_id.trim().is_empty() {
            errors.push(ValidationError::new(
                "infDPS.Id",
                "required",
                "DPS ID is required",
            ));
        }

        match (&self.provider_cnpj, &self.provider_cpf) {
            (None, None) => errors.push(ValidationError::new(
                "prest",
                "required",
                "Provider CNPJ or CPF is required",
            )),
            (Some(_), Some(_)) => errors.push(ValidationError::new(
                "prest",
                "ambiguous_provider",
                "Provider must be identified by CNPJ or CPF, not both",
            )),
            _ => {}
        }

        if let Some(cnpj) = &self.provider_cnpj {
            if cnpj.len() != 14 {
                errors.push(ValidationError::new(
                    "prest.CNPJ",
                    "invalid_length",
                    "Provider CNPJ must be 14 digits",
                ));
            }
        }

        if let Some(cpf) = &self.provider_cpf {
            if cpf.len() != 11 {
                errors.push(ValidationError::new(
                    "prest.CPF",
                    "invalid_length",
                    "Provider CPF must be 11 digits",
                ));
            }
        }

        if self.environment().is_none() {
            errors.push(ValidationError::new(
                "tpAmb",
                "invalid_value",
                "Environment must be 1 (production) or 2 (homologation)",
            ));
        }

        if !self.has_signature {
            errors.push(ValidationError::new(
                "Signature",
                "XML_NOT_SIGNED",
                "XML document is not signed (no Signature element found)",
            ));
        }

        errors
    }
}
