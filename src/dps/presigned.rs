//! Extraction of fields from a DPS the client already signed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use super::xml_utils::{XmlNode, digits_only, parse_datetime, parse_decimal, parse_document};
use crate::core::{PreSignedInfo, XmlParseError};

/// Transport envelope for a pre-signed submission: the XML, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSignedXmlRequest {
    pub xml: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl PreSignedXmlRequest {
    /// Decode the base64 payload into XML text.
    pub fn decode_xml(&self) -> Result<String, XmlParseError> {
        let payload = self.xml.trim();
        if payload.is_empty() {
            return Err(XmlParseError::InvalidBase64("payload is empty".into()));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| XmlParseError::InvalidBase64(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| XmlParseError::InvalidBase64(e.to_string()))
    }
}

/// Parse a signed DPS and extract its identity, provider, service and value
/// fields. Whether a `Signature` block is present is recorded, not verified.
///
/// The `DPS` element may be the root or nested inside an envelope.
pub fn parse_presigned_xml(xml: &str) -> Result<PreSignedInfo, XmlParseError> {
    let root = parse_document(xml)?;
    let dps = root.find("DPS").ok_or_else(|| XmlParseError::MissingRoot {
        expected: "DPS",
        found: root.name.clone(),
    })?;
    let inf = dps
        .child("infDPS")
        .ok_or(XmlParseError::MissingWrapper("infDPS"))?;
    let dps_id = inf
        .attr("Id")
        .ok_or(XmlParseError::MissingIdAttribute("infDPS"))?
        .to_string();

    let prest = inf.child("prest").ok_or(XmlParseError::MissingProvider)?;
    let id_of = |tag: &str| prest.child_text(tag).map(digits_only).filter(|v| !v.is_empty());
    let provider_cnpj = id_of("CNPJ");
    let provider_cpf = id_of("CPF");
    if provider_cnpj.is_none() && provider_cpf.is_none() {
        return Err(XmlParseError::MissingProviderId);
    }

    let text = |node: Option<&XmlNode>, name: &str| -> String {
        node.and_then(|n| n.child_text(name))
            .unwrap_or_default()
            .to_string()
    };
    let serv = inf.child("serv");

    Ok(PreSignedInfo {
        dps_id,
        provider_cnpj,
        provider_cpf,
        provider_name: text(Some(prest), "xNome"),
        municipality_code: text(Some(inf), "cLocEmi"),
        series: text(Some(inf), "serie"),
        number: text(Some(inf), "nDPS"),
        service_value: service_value(inf.child("valores"))?,
        environment_code: inf.child_text("tpAmb").and_then(|v| v.parse().ok()),
        issued_at: inf
            .child_text("dhEmi")
            .and_then(|s| parse_datetime(s, false)),
        national_service_code: digits_only(&text(serv, "cTribNac")),
        service_description: text(serv, "xDescServ"),
        service_municipality_code: digits_only(&text(serv, "cLocPrest")),
        has_signature: dps.child("Signature").is_some(),
    })
}

fn service_value(valores: Option<&XmlNode>) -> Result<Option<rust_decimal::Decimal>, XmlParseError> {
    let Some(valores) = valores else {
        return Ok(None);
    };
    let (element, raw) = match valores.child("vServPrest") {
        Some(node) => match node.child_text("vServ") {
            Some(v) => ("vServ", v),
            None => ("vServPrest", node.text()),
        },
        None => match valores.child_text("vServ") {
            Some(v) => ("vServ", v),
            None => return Ok(None),
        },
    };
    if raw.is_empty() {
        return Ok(None);
    }
    parse_decimal(raw)
        .map(Some)
        .ok_or_else(|| XmlParseError::InvalidDecimal {
            element,
            value: raw.to_string(),
        })
}
