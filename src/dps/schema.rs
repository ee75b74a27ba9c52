//! Structural validation of DPS documents (XSD-lite).
//!
//! A deliberate subset of the national DPS schema: every business element
//! the backend rejects most often is checked for presence, type and range.
//! All violations are collected so a single response can report every
//! problem at once.

use tracing::debug;

use super::NFSE_NAMESPACE;
use super::xml_utils::{
    XmlNode, is_digits, is_positive_xsd_decimal, is_xsd_decimal, parse_document, parse_xsd_date,
    parse_xsd_datetime,
};
use crate::core::{Environment, SchemaViolation, ViolationCode};

/// Maximum length of `xDescServ`, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

fn violation(
    code: ViolationCode,
    element: impl Into<String>,
    message: impl Into<String>,
    value: Option<&str>,
) -> SchemaViolation {
    SchemaViolation {
        code,
        element: element.into(),
        message: message.into(),
        value: value.map(str::to_string),
    }
}

/// Trimmed text of a required child; records a missing-element violation
/// when the child is absent.
fn required<'n>(
    parent: &'n XmlNode,
    path: &str,
    name: &str,
    label: &str,
    out: &mut Vec<SchemaViolation>,
) -> Option<&'n str> {
    let text = parent.child_text(name);
    if text.is_none() {
        let message = if label.is_empty() {
            format!("required element '{name}' not found")
        } else {
            format!("required element '{name}' ({label}) not found")
        };
        out.push(violation(
            ViolationCode::MissingElement,
            format!("{path}/{name}"),
            message,
            None,
        ));
    }
    text
}

fn check_one_of(
    value: &str,
    allowed: &[&str],
    element: &str,
    message: &str,
    out: &mut Vec<SchemaViolation>,
) {
    if !allowed.contains(&value) {
        out.push(violation(ViolationCode::InvalidValue, element, message, Some(value)));
    }
}

fn check_digits(value: &str, n: usize, element: &str, message: &str, out: &mut Vec<SchemaViolation>) {
    if !is_digits(value, n) {
        out.push(violation(ViolationCode::InvalidFormat, element, message, Some(value)));
    }
}

/// Validate a DPS document. An empty result means the document passed.
pub fn validate_dps(xml: &str) -> Vec<SchemaViolation> {
    let mut out = Vec::new();

    let root = match parse_document(xml) {
        Ok(root) => root,
        Err(e) => {
            out.push(violation(
                ViolationCode::InvalidFormat,
                "document",
                format!("failed to parse XML: {e}"),
                None,
            ));
            return out;
        }
    };

    if root.name != "DPS" {
        out.push(violation(
            ViolationCode::MissingElement,
            "DPS",
            format!("expected root element 'DPS', found '{}'", root.name),
            Some(&root.name),
        ));
        return out;
    }

    if !root.declares_namespace(NFSE_NAMESPACE) {
        out.push(violation(
            ViolationCode::InvalidNamespace,
            "DPS",
            format!("DPS element should have namespace '{NFSE_NAMESPACE}'"),
            root.namespace(),
        ));
    }

    let Some(inf) = root.child("infDPS") else {
        out.push(violation(
            ViolationCode::MissingElement,
            "DPS/infDPS",
            "required element 'infDPS' not found",
            None,
        ));
        return out;
    };

    if inf.attr("Id").is_none() {
        out.push(violation(
            ViolationCode::MissingAttribute,
            "DPS/infDPS",
            "required attribute 'Id' not found on infDPS",
            None,
        ));
    }

    validate_header(inf, &mut out);
    validate_provider(inf, &mut out);
    validate_service(inf, &mut out);
    validate_values(inf, &mut out);

    debug!(violations = out.len(), "DPS structural validation finished");
    out
}

fn validate_header(inf: &XmlNode, out: &mut Vec<SchemaViolation>) {
    const P: &str = "infDPS";

    if let Some(v) = required(inf, P, "tpAmb", "environment type", out) {
        check_one_of(
            v,
            &["1", "2"],
            "infDPS/tpAmb",
            "tpAmb must be '1' (production) or '2' (homologation)",
            out,
        );
    }

    if let Some(v) = required(inf, P, "dhEmi", "emission date/time", out) {
        if parse_xsd_datetime(v).is_none() {
            out.push(violation(
                ViolationCode::InvalidDataType,
                "infDPS/dhEmi",
                "dhEmi must be a valid ISO 8601 datetime (e.g., 2024-01-15T10:30:00-03:00)",
                Some(v),
            ));
        }
    }

    if let Some(v) = required(inf, P, "verAplic", "application version", out) {
        if v.is_empty() {
            out.push(violation(
                ViolationCode::InvalidValue,
                "infDPS/verAplic",
                "element 'verAplic' (application version) cannot be empty",
                None,
            ));
        }
    }

    if let Some(v) = required(inf, P, "serie", "", out) {
        check_digits(v, 5, "infDPS/serie", "serie must be exactly 5 digits", out);
    }

    if let Some(v) = required(inf, P, "nDPS", "DPS number", out) {
        let ok = (1..=15).contains(&v.len()) && v.bytes().all(|b| b.is_ascii_digit());
        if !ok {
            out.push(violation(
                ViolationCode::InvalidFormat,
                "infDPS/nDPS",
                "nDPS must be 1 to 15 digits",
                Some(v),
            ));
        }
    }

    if let Some(v) = required(inf, P, "dCompet", "competence date", out) {
        if parse_xsd_date(v).is_none() {
            out.push(violation(
                ViolationCode::InvalidDataType,
                "infDPS/dCompet",
                "dCompet must be a valid date in YYYY-MM-DD format",
                Some(v),
            ));
        }
    }

    if let Some(v) = required(inf, P, "tpEmit", "emitter type", out) {
        check_one_of(
            v,
            &["1", "2", "3"],
            "infDPS/tpEmit",
            "tpEmit must be '1' (provider), '2' (taker), or '3' (intermediary)",
            out,
        );
    }

    if let Some(v) = required(inf, P, "cLocEmi", "emission municipality code", out) {
        check_digits(
            v,
            7,
            "infDPS/cLocEmi",
            "cLocEmi must be exactly 7 digits (IBGE municipality code)",
            out,
        );
    }

    if let Some(v) = required(inf, P, "subst", "substitution", out) {
        check_one_of(
            v,
            &["1", "2"],
            "infDPS/subst",
            "subst must be '1' (substitution) or '2' (no substitution)",
            out,
        );
    }
}

fn validate_provider(inf: &XmlNode, out: &mut Vec<SchemaViolation>) {
    let Some(prest) = inf.child("prest") else {
        out.push(violation(
            ViolationCode::MissingElement,
            "infDPS/prest",
            "required element 'prest' (provider) not found",
            None,
        ));
        return;
    };

    let cnpj = prest.child_text("CNPJ");
    let cpf = prest.child_text("CPF");
    match (cnpj, cpf) {
        (None, None) => out.push(violation(
            ViolationCode::MissingElement,
            "infDPS/prest",
            "provider must have either CNPJ or CPF",
            None,
        )),
        (Some(_), Some(_)) => out.push(violation(
            ViolationCode::InvalidValue,
            "infDPS/prest",
            "provider must have either CNPJ or CPF, not both",
            None,
        )),
        _ => {}
    }

    if let Some(v) = cnpj {
        check_digits(v, 14, "infDPS/prest/CNPJ", "CNPJ must be exactly 14 digits", out);
    }
    if let Some(v) = cpf {
        check_digits(v, 11, "infDPS/prest/CPF", "CPF must be exactly 11 digits", out);
    }
}

fn validate_service(inf: &XmlNode, out: &mut Vec<SchemaViolation>) {
    const P: &str = "infDPS/serv";

    let Some(serv) = inf.child("serv") else {
        out.push(violation(
            ViolationCode::MissingElement,
            "infDPS/serv",
            "required element 'serv' (service) not found",
            None,
        ));
        return;
    };

    if let Some(v) = required(serv, P, "cTribNac", "national service code", out) {
        check_digits(v, 6, "infDPS/serv/cTribNac", "cTribNac must be exactly 6 digits", out);
    }

    if let Some(v) = required(serv, P, "xDescServ", "service description", out) {
        let chars = v.chars().count();
        if chars == 0 {
            out.push(violation(
                ViolationCode::InvalidValue,
                "infDPS/serv/xDescServ",
                "service description cannot be empty",
                None,
            ));
        } else if chars > MAX_DESCRIPTION_CHARS {
            out.push(violation(
                ViolationCode::InvalidValue,
                "infDPS/serv/xDescServ",
                format!("service description cannot exceed {MAX_DESCRIPTION_CHARS} characters"),
                Some(&format!("{chars} characters")),
            ));
        }
    }

    if let Some(v) = required(serv, P, "cLocPrest", "service location municipality code", out) {
        check_digits(
            v,
            7,
            "infDPS/serv/cLocPrest",
            "cLocPrest must be exactly 7 digits (IBGE municipality code)",
            out,
        );
    }
}

/// `vServPrest` is either a leaf or wraps `vServ`; `vServ` alone is also accepted.
fn service_value(valores: &XmlNode) -> Option<&str> {
    match valores.child("vServPrest") {
        Some(node) => node.child_text("vServ").or(Some(node.text())),
        None => valores.child_text("vServ"),
    }
}

fn validate_values(inf: &XmlNode, out: &mut Vec<SchemaViolation>) {
    const E: &str = "infDPS/valores/vServPrest";

    let Some(valores) = inf.child("valores") else {
        out.push(violation(
            ViolationCode::MissingElement,
            "infDPS/valores",
            "required element 'valores' (values) not found",
            None,
        ));
        return;
    };

    let Some(v) = service_value(valores) else {
        out.push(violation(
            ViolationCode::MissingElement,
            E,
            "required element 'vServPrest' (service value) not found",
            None,
        ));
        return;
    };

    if !is_xsd_decimal(v) {
        out.push(violation(
            ViolationCode::InvalidDataType,
            E,
            "vServPrest must be a valid decimal number",
            Some(v),
        ));
    } else if !is_positive_xsd_decimal(v) {
        out.push(violation(
            ViolationCode::InvalidValue,
            E,
            "vServPrest must be greater than zero",
            Some(v),
        ));
    }
}

/// Declared environment (`tpAmb`) of a DPS document, if readable.
pub fn environment_of(xml: &str) -> Option<Environment> {
    let root = parse_document(xml).ok()?;
    let code = root.find("tpAmb")?.text().parse::<u32>().ok()?;
    Environment::from_code(code)
}

/// Human-readable multi-line report of a violation list.
pub fn render_violations(violations: &[SchemaViolation]) -> String {
    if violations.is_empty() {
        return "DPS passed structural validation".to_string();
    }
    let mut report = format!(
        "DPS failed structural validation with {} violation(s):",
        violations.len()
    );
    for (i, v) in violations.iter().enumerate() {
        report.push_str(&format!("\n{}. {v}", i + 1));
    }
    report
}
