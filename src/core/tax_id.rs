//! CNPJ / CPF check digits and taker identification.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

pub const CNPJ_LENGTH: usize = 14;
pub const CPF_LENGTH: usize = 11;
/// Maximum length of a foreign tax id (NIF).
pub const NIF_MAX_LENGTH: usize = 40;

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Drop every character that is not an ASCII digit (`.`, `/`, `-`, spaces...).
pub fn clean_tax_id(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Modulo-11 check digit over `digits` weighted by `weights`.
fn check_digit(digits: &[u32], weights: impl IntoIterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        0 | 1 => 0,
        r => 11 - r,
    }
}

/// Digits of a cleaned id of the given length, or `None` when the length is
/// wrong or every digit is the same (`00000000000`, `11111111111111`...).
fn digits_of(value: &str, len: usize) -> Option<Vec<u32>> {
    let cleaned = clean_tax_id(value);
    if cleaned.len() != len {
        return None;
    }
    let digits: Vec<u32> = cleaned.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.iter().all(|d| *d == digits[0]) {
        return None;
    }
    Some(digits)
}

/// Whether a CNPJ, formatted or not, carries valid check digits.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let Some(d) = digits_of(cnpj, CNPJ_LENGTH) else {
        return false;
    };
    d[12] == check_digit(&d[..12], CNPJ_FIRST_WEIGHTS)
        && d[13] == check_digit(&d[..13], CNPJ_SECOND_WEIGHTS)
}

/// Whether a CPF, formatted or not, carries valid check digits.
pub fn validate_cpf(cpf: &str) -> bool {
    let Some(d) = digits_of(cpf, CPF_LENGTH) else {
        return false;
    };
    d[9] == check_digit(&d[..9], (2..=10).rev()) && d[10] == check_digit(&d[..10], (2..=11).rev())
}

/// Kind of Brazilian federal tax id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxIdKind {
    Cnpj,
    Cpf,
}

/// Classify an id by its digit count and check it.
///
/// Returns `None` when the cleaned id is neither 11 nor 14 digits long.
pub fn classify_tax_id(value: &str) -> Option<(TaxIdKind, bool)> {
    match clean_tax_id(value).len() {
        CPF_LENGTH => Some((TaxIdKind::Cpf, validate_cpf(value))),
        CNPJ_LENGTH => Some((TaxIdKind::Cnpj, validate_cnpj(value))),
        _ => None,
    }
}

/// `XX.XXX.XXX/XXXX-XX`, or the cleaned digits when not 14 long.
pub fn format_cnpj(cnpj: &str) -> String {
    let c = clean_tax_id(cnpj);
    if c.len() != CNPJ_LENGTH {
        return c;
    }
    format!("{}.{}.{}/{}-{}", &c[..2], &c[2..5], &c[5..8], &c[8..12], &c[12..])
}

/// `XXX.XXX.XXX-XX`, or the cleaned digits when not 11 long.
pub fn format_cpf(cpf: &str) -> String {
    let c = clean_tax_id(cpf);
    if c.len() != CPF_LENGTH {
        return c;
    }
    format!("{}.{}.{}-{}", &c[..3], &c[3..6], &c[6..9], &c[9..])
}

/// How a service taker identifies itself. Blank fields count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerIdentification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    /// Foreign tax id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nif: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Check that a taker carries exactly one of CNPJ, CPF or NIF and that the
/// one it carries is well formed.
pub fn validate_taker(taker: &TakerIdentification) -> Vec<ValidationError> {
    let (cnpj, cpf, nif) = (present(&taker.cnpj), present(&taker.cpf), present(&taker.nif));

    let mut errors = Vec::new();
    match [cnpj, cpf, nif].iter().flatten().count() {
        0 => {
            errors.push(ValidationError::new(
                "taker",
                "required",
                "Taker must have exactly one of CNPJ, CPF, or NIF",
            ));
            return errors;
        }
        1 => {}
        _ => {
            errors.push(ValidationError::new(
                "taker",
                "invalid",
                "Taker must have only one of CNPJ, CPF, or NIF (they are mutually exclusive)",
            ));
            return errors;
        }
    }

    if let Some(v) = cnpj {
        if !validate_cnpj(v) {
            errors.push(ValidationError::new(
                "taker.cnpj",
                "invalid",
                "Taker CNPJ is invalid (check digit mismatch or incorrect format)",
            ));
        }
    }
    if let Some(v) = cpf {
        if !validate_cpf(v) {
            errors.push(ValidationError::new(
                "taker.cpf",
                "invalid",
                "Taker CPF is invalid (check digit mismatch or incorrect format)",
            ));
        }
    }
    if let Some(v) = nif {
        if v.chars().count() > NIF_MAX_LENGTH {
            errors.push(ValidationError::new(
                "taker.nif",
                "too_long",
                format!("NIF must not exceed {NIF_MAX_LENGTH} characters"),
            ));
        } else if !v.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(ValidationError::new(
                "taker.nif",
                "invalid_format",
                format!("NIF must contain only alphanumeric characters (1-{NIF_MAX_LENGTH} chars)"),
            ));
        }
    }
    errors
}
