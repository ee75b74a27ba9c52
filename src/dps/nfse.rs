//! Parsing of issued NFS-e documents returned by the national backend.

use rust_decimal::Decimal;
use tracing::warn;

use super::xml_utils::{XmlNode, parse_datetime, parse_decimal, parse_document};
use crate::core::{
    ACCESS_KEY_LENGTH, ACCESS_KEY_PREFIX, NfseData, NfseStatus, ProviderData, ServiceData,
    TakerData, TakerDocumentKind, ValuesData, XmlParseError,
};

/// Parse an `NFSe/infNFSe` document into an [`NfseData`] record.
///
/// Optional sections that are absent yield empty fields. Monetary values
/// accept `.` or `,` as the fractional separator; a value that is present
/// but unreadable is an error rather than a silent zero.
pub fn parse_nfse_xml(xml: &str) -> Result<NfseData, XmlParseError> {
    let root = parse_document(xml)?;
    if root.name != "NFSe" {
        return Err(XmlParseError::MissingRoot {
            expected: "NFSe",
            found: root.name,
        });
    }
    let inf = root
        .child("infNFSe")
        .ok_or(XmlParseError::MissingWrapper("infNFSe"))?;

    let text = |node: Option<&XmlNode>, name: &str| -> String {
        node.and_then(|n| n.child_text(name))
            .unwrap_or_default()
            .to_string()
    };

    let raw_status = text(Some(inf), "sit");
    let status = resolve_status(&raw_status);

    let emit = inf.child("emit");
    let ender = emit.and_then(|e| e.child("ender"));
    let provider = ProviderData {
        document: text(emit, "CNPJ"),
        name: text(emit, "xNome"),
        municipality: text(ender, "xMun"),
        municipality_code: text(ender, "cMun"),
    };

    let serv = inf.child("serv");
    let local = serv.and_then(|s| s.child("localPrest"));
    let service = ServiceData {
        national_code: text(serv, "cTribNac"),
        description: text(serv, "xDescServ"),
        location: format_location(&text(local, "xMun"), &text(local, "UF")),
        municipality_code: text(local, "cMun"),
    };

    Ok(NfseData {
        access_key: access_key_of(inf),
        number: text(Some(inf), "nNFSe"),
        issued_at: inf
            .child_text("dhEmi")
            .and_then(|s| parse_datetime(s, true)),
        status,
        raw_status,
        provider,
        taker: inf.child("toma").and_then(parse_taker),
        service,
        values: parse_values(inf.child("valores"))?,
    })
}

/// Map `sit` to a status. Empty and unrecognized codes resolve to
/// [`NfseStatus::Active`]; the raw code stays on the record.
fn resolve_status(raw: &str) -> NfseStatus {
    match NfseStatus::from_code(raw) {
        Some(status) => status,
        None => {
            if !raw.is_empty() {
                warn!(status = raw, "unrecognized NFS-e status code, defaulting to active");
            }
            NfseStatus::Active
        }
    }
}

/// `chNFSe` when present, otherwise the `Id` attribute with its `NFSe`
/// prefix removed when that leaves a full-length key.
fn access_key_of(inf: &XmlNode) -> String {
    if let Some(key) = inf.child_text("chNFSe").filter(|k| !k.is_empty()) {
        return key.to_string();
    }
    let id = inf.attr("Id").unwrap_or_default().trim();
    match id.strip_prefix(ACCESS_KEY_PREFIX) {
        Some(rest) if rest.len() >= ACCESS_KEY_LENGTH || id.len() < ACCESS_KEY_LENGTH => {
            rest.to_string()
        }
        _ => id.to_string(),
    }
}

fn parse_taker(toma: &XmlNode) -> Option<TakerData> {
    let (document, document_kind) = [
        ("CNPJ", TakerDocumentKind::Cnpj),
        ("CPF", TakerDocumentKind::Cpf),
        ("NIF", TakerDocumentKind::Nif),
    ]
    .into_iter()
    .find_map(|(tag, kind)| {
        toma.child_text(tag)
            .filter(|v| !v.is_empty())
            .map(|v| (v.to_string(), kind))
    })?;

    Some(TakerData {
        document,
        document_kind,
        name: toma.child_text("xNome").unwrap_or_default().to_string(),
    })
}

fn parse_values(valores: Option<&XmlNode>) -> Result<ValuesData, XmlParseError> {
    let Some(valores) = valores else {
        return Ok(ValuesData::default());
    };

    let amount = |tag: &'static str| -> Result<Option<Decimal>, XmlParseError> {
        match valores.child_text(tag) {
            None | Some("") => Ok(None),
            Some(v) => parse_decimal(v)
                .map(Some)
                .ok_or_else(|| XmlParseError::InvalidDecimal {
                    element: tag,
                    value: v.to_string(),
                }),
        }
    };

    Ok(ValuesData {
        service_value: amount("vServico")?.unwrap_or_default(),
        tax_base: amount("vBC")?.unwrap_or_default(),
        rate: amount("pAliq")?,
        tax_amount: amount("vISS")?,
        net_value: amount("vLiq")?.unwrap_or_default(),
    })
}

fn format_location(city: &str, state: &str) -> String {
    match (city.is_empty(), state.is_empty()) {
        (false, false) => format!("{city} - {state}"),
        (false, true) => city.to_string(),
        _ => String::new(),
    }
}
