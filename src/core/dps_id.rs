//! DPS identifier grammar.
//!
//! A DPS identifier is a 42-digit string laid out positionally:
//!
//! | Segment | Width |
//! |---------|-------|
//! | IBGE municipality code | 7 |
//! | Registration type (1 = CNPJ, 2 = CPF) | 1 |
//! | Federal registration, zero-padded | 14 |
//! | Series | 5 |
//! | Number | 15 |
//!
//! CPF registrants carry an 11-digit CPF, so their federal registration
//! segment must start with three padding zeros.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DPS_ID_LENGTH: usize = 42;

const MUNICIPALITY_LEN: usize = 7;
const FEDERAL_REGISTRATION_LEN: usize = 14;
const SERIES_LEN: usize = 5;
const NUMBER_LEN: usize = 15;
const CPF_LEN: usize = 11;
const CPF_PADDING: &str = "000";

/// Kind of federal registration identifying the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationType {
    /// Company (CNPJ, 14 digits).
    Cnpj,
    /// Individual or MEI (CPF, 11 digits).
    Cpf,
}

impl RegistrationType {
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Self::Cnpj),
            2 => Some(Self::Cpf),
            _ => None,
        }
    }

    pub fn digit(self) -> u8 {
        match self {
            Self::Cnpj => 1,
            Self::Cpf => 2,
        }
    }
}

/// Positional segment of a DPS identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DpsSegment {
    Municipality,
    FederalRegistration,
    Series,
    Number,
}

impl DpsSegment {
    pub fn width(self) -> usize {
        match self {
            Self::Municipality => MUNICIPALITY_LEN,
            Self::FederalRegistration => FEDERAL_REGISTRATION_LEN,
            Self::Series => SERIES_LEN,
            Self::Number => NUMBER_LEN,
        }
    }
}

impl std::fmt::Display for DpsSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Municipality => "municipality code",
            Self::FederalRegistration => "federal registration",
            Self::Series => "series",
            Self::Number => "number",
        })
    }
}

/// Why a DPS identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DpsIdError {
    #[error("DPS id cannot be empty")]
    Empty,

    #[error("DPS id must be exactly {DPS_ID_LENGTH} characters, got {0} characters")]
    WrongLength(usize),

    #[error("DPS id must contain only numeric characters")]
    NonNumeric,

    #[error("unsupported registration type '{0}': must be 1 (CNPJ) or 2 (CPF)")]
    UnsupportedRegistrationType(String),

    #[error("invalid {segment}: must be {} digits, got '{value}'", .segment.width())]
    MalformedSegment { segment: DpsSegment, value: String },

    #[error("CPF federal registration must start with {CPF_PADDING}, got '{0}'")]
    CpfPadding(String),
}

/// A parsed DPS identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DpsId {
    pub municipality_code: String,
    pub registration_type: RegistrationType,
    /// Always 14 digits; CPF registrations carry three leading zeros.
    pub federal_registration: String,
    pub series: String,
    pub number: String,
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn left_pad(s: &str, width: usize) -> String {
    if !s.is_empty() && s.len() < width {
        format!("{s:0>width$}")
    } else {
        s.to_string()
    }
}

impl DpsId {
    /// Parse a 42-character identifier.
    pub fn parse(id: &str) -> Result<Self, DpsIdError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(DpsIdError::Empty);
        }

        let len = id.chars().count();
        if len != DPS_ID_LENGTH {
            return Err(DpsIdError::WrongLength(len));
        }
        if !all_digits(id) {
            return Err(DpsIdError::NonNumeric);
        }

        // ASCII digits only from here on
        let (municipality, rest) = id.split_at(MUNICIPALITY_LEN);
        let (type_digit, rest) = rest.split_at(1);
        let (federal, rest) = rest.split_at(FEDERAL_REGISTRATION_LEN);
        let (series, number) = rest.split_at(SERIES_LEN);

        let registration_type = type_digit
            .parse::<u8>()
            .ok()
            .and_then(RegistrationType::from_digit)
            .ok_or_else(|| DpsIdError::UnsupportedRegistrationType(type_digit.to_string()))?;

        if registration_type == RegistrationType::Cpf && !federal.starts_with(CPF_PADDING) {
            return Err(DpsIdError::CpfPadding(federal.to_string()));
        }

        Ok(Self {
            municipality_code: municipality.to_string(),
            registration_type,
            federal_registration: federal.to_string(),
            series: series.to_string(),
            number: number.to_string(),
        })
    }

    /// Build an identifier from its components.
    ///
    /// Formatting characters (`.`, `-`, `/`) are stripped from the federal
    /// registration, an 11-digit CPF is padded to 14, and series and number
    /// are left-padded with zeros. The result is then validated.
    pub fn new(
        municipality_code: &str,
        registration_type: u8,
        federal_registration: &str,
        series: &str,
        number: &str,
    ) -> Result<Self, DpsIdError> {
        let registration_type = RegistrationType::from_digit(registration_type)
            .ok_or_else(|| DpsIdError::UnsupportedRegistrationType(registration_type.to_string()))?;

        let mut federal: String = federal_registration
            .trim()
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | '/'))
            .collect();
        if registration_type == RegistrationType::Cpf && federal.len() == CPF_LEN {
            federal = left_pad(&federal, FEDERAL_REGISTRATION_LEN);
        }

        let id = Self {
            municipality_code: municipality_code.trim().to_string(),
            registration_type,
            federal_registration: federal,
            series: left_pad(series.trim(), SERIES_LEN),
            number: left_pad(number.trim(), NUMBER_LEN),
        };
        id.validate()?;
        Ok(id)
    }

    /// Check every segment, reporting the first malformed one.
    pub fn validate(&self) -> Result<(), DpsIdError> {
        let check = |segment: DpsSegment, value: &str| {
            if value.len() == segment.width() && all_digits(value) {
                Ok(())
            } else {
                Err(DpsIdError::MalformedSegment {
                    segment,
                    value: value.to_string(),
                })
            }
        };

        check(DpsSegment::Municipality, &self.municipality_code)?;
        check(DpsSegment::FederalRegistration, &self.federal_registration)?;
        if self.registration_type == RegistrationType::Cpf
            && !self.federal_registration.starts_with(CPF_PADDING)
        {
            return Err(DpsIdError::CpfPadding(self.federal_registration.clone()));
        }
        check(DpsSegment::Series, &self.series)?;
        check(DpsSegment::Number, &self.number)
    }

    /// The CNPJ, for company registrations.
    pub fn cnpj(&self) -> Option<&str> {
        (self.registration_type == RegistrationType::Cnpj).then_some(self.federal_registration.as_str())
    }

    /// The 11-digit CPF without its padding, for individual registrations.
    pub fn cpf(&self) -> Option<&str> {
        if self.registration_type != RegistrationType::Cpf {
            return None;
        }
        self.federal_registration.strip_prefix(CPF_PADDING)
    }
}

impl std::fmt::Display for DpsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.municipality_code,
            self.registration_type.digit(),
            self.federal_registration,
            self.series,
            self.number
        )
    }
}

impl std::str::FromStr for DpsId {
    type Err = DpsIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
