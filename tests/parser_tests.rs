#![cfg(feature = "xml")]

use std::cell::Cell;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use nfse_nacional::core::*;
use nfse_nacional::dps::{PreSignedXmlRequest, check_presigned_submission, parse_nfse_xml, parse_presigned_xml};
use rust_decimal_macros::dec;

const KEY: &str = "NFSe35503081234567800019900001000000000000001abcde";

fn nfse_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<NFSe xmlns="http://www.sped.fazenda.gov.br/nfse" versao="1.00">
  <infNFSe Id="NFS{KEY}">
    <nNFSe>42</nNFSe>
    <chNFSe>{KEY}</chNFSe>
    <dhEmi>2024-01-15T10:30:00-03:00</dhEmi>
    <sit>1</sit>
    <emit>
      <CNPJ>12345678000199</CNPJ>
      <xNome>Provider Company Ltd</xNome>
      <ender><cMun>3550308</cMun><xMun>São Paulo</xMun></ender>
    </emit>
    <toma>
      <CPF>12345678901</CPF>
      <xNome>Maria Silva</xNome>
    </toma>
    <serv>
      <cTribNac>010101</cTribNac>
      <xDescServ>Software development &amp; support</xDescServ>
      <localPrest><cMun>3550308</cMun><xMun>São Paulo</xMun><UF>SP</UF></localPrest>
    </serv>
    <valores>
      <vServico>1000.00</vServico>
      <vBC>1000.00</vBC>
      <pAliq>5.00</pAliq>
      <vISS>50.00</vISS>
      <vLiq>950.00</vLiq>
    </valores>
  </infNFSe>
</NFSe>"#
    )
}

const SIGNED_DPS: &str = r#"<DPS xmlns="http://www.sped.fazenda.gov.br/nfse">
  <infDPS Id="DPS355030811234567800019900001000000000123456">
    <tpAmb>2</tpAmb>
    <dhEmi>2024-01-15T10:30:00-03:00</dhEmi>
    <verAplic>1.0.0</verAplic>
    <serie>00001</serie>
    <nDPS>123456</nDPS>
    <dCompet>2024-01-15</dCompet>
    <tpEmit>1</tpEmit>
    <cLocEmi>3550308</cLocEmi>
    <subst>2</subst>
    <prest>
      <CNPJ>12345678000190</CNPJ>
      <xNome>Provider Company Ltd</xNome>
    </prest>
    <serv>
      <cTribNac>010101</cTribNac>
      <xDescServ>Software development services</xDescServ>
      <cLocPrest>3550308</cLocPrest>
    </serv>
    <valores>
      <vServPrest>1000.00</vServPrest>
    </valores>
  </infDPS>
  <Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo/></Signature>
</DPS>"#;

fn signed_with(from: &str, to: &str) -> String {
    assert!(SIGNED_DPS.contains(from), "fixture does not contain {from}");
    SIGNED_DPS.replacen(from, to, 1)
}

struct MockVerifier {
    valid: bool,
    errors: Vec<String>,
    calls: Cell<usize>,
}

impl MockVerifier {
    fn accepting() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            calls: Cell::new(0),
        }
    }

    fn rejecting(errors: &[&str]) -> Self {
        Self {
            valid: false,
            errors: errors.iter().map(|e| e.to_string()).collect(),
            calls: Cell::new(0),
        }
    }
}

impl SignatureVerifier for MockVerifier {
    fn verify_document_signature(&self, _xml: &str) -> SignatureVerification {
        self.calls.set(self.calls.get() + 1);
        SignatureVerification {
            valid: self.valid,
            signer_identity: Some("CN=PROVIDER COMPANY LTD:12345678000190".into()),
            errors: self.errors.clone(),
        }
    }
}

// --- Issued NFS-e ---

#[test]
fn nfse_full_document() {
    let nfse = parse_nfse_xml(&nfse_xml()).unwrap();
    assert_eq!(nfse.access_key, KEY);
    assert_eq!(nfse.number, "42");
    assert_eq!(nfse.status, NfseStatus::Active);
    assert_eq!(nfse.raw_status, "1");
    assert_eq!(
        nfse.issued_at.unwrap().to_rfc3339(),
        "2024-01-15T10:30:00-03:00"
    );

    assert_eq!(nfse.provider.document, "12345678000199");
    assert_eq!(nfse.provider.name, "Provider Company Ltd");
    assert_eq!(nfse.provider.municipality, "São Paulo");
    assert_eq!(nfse.provider.municipality_code, "3550308");

    let taker = nfse.taker.as_ref().unwrap();
    assert_eq!(taker.document, "12345678901");
    assert_eq!(taker.document_kind, TakerDocumentKind::Cpf);
    assert_eq!(taker.name, "Maria Silva");

    assert_eq!(nfse.service.description, "Software development & support");
    assert_eq!(nfse.service.location, "São Paulo - SP");
    assert_eq!(nfse.service.municipality_code, "3550308");

    assert_eq!(nfse.values.service_value, dec!(1000.00));
    assert_eq!(nfse.values.rate, Some(dec!(5.00)));
    assert_eq!(nfse.values.tax_amount, Some(dec!(50.00)));
    assert_eq!(nfse.values.net_value, dec!(950.00));
}

#[test]
fn nfse_parse_is_deterministic() {
    let xml = nfse_xml();
    assert_eq!(parse_nfse_xml(&xml).unwrap(), parse_nfse_xml(&xml).unwrap());
}

#[test]
fn nfse_tolerates_byte_order_mark() {
    let xml = format!("\u{feff}{}", nfse_xml());
    assert_eq!(parse_nfse_xml(&xml).unwrap().access_key, KEY);
}

#[test]
fn nfse_key_falls_back_to_id_attribute() {
    let xml = nfse_xml()
        .replace(&format!("<chNFSe>{KEY}</chNFSe>"), "")
        .replace(&format!("Id=\"NFS{KEY}\""), &format!("Id=\"NFSe{KEY}\""));
    assert_eq!(parse_nfse_xml(&xml).unwrap().access_key, KEY);

    let bare = nfse_xml()
        .replace(&format!("<chNFSe>{KEY}</chNFSe>"), "")
        .replace(&format!("Id=\"NFS{KEY}\""), &format!("Id=\"{KEY}\""));
    assert_eq!(parse_nfse_xml(&bare).unwrap().access_key, KEY);
}

#[test]
fn nfse_status_codes() {
    let cases = [
        ("2", NfseStatus::Cancelled),
        ("101", NfseStatus::Cancelled),
        ("3", NfseStatus::Substituted),
        ("100", NfseStatus::Active),
        ("77", NfseStatus::Active),
    ];
    for (raw, expected) in cases {
        let xml = nfse_xml().replace("<sit>1</sit>", &format!("<sit>{raw}</sit>"));
        let nfse = parse_nfse_xml(&xml).unwrap();
        assert_eq!(nfse.status, expected, "sit={raw}");
        assert_eq!(nfse.raw_status, raw);
    }

    let no_status = nfse_xml().replace("<sit>1</sit>", "");
    let nfse = parse_nfse_xml(&no_status).unwrap();
    assert_eq!(nfse.status, NfseStatus::Active);
    assert_eq!(nfse.raw_status, "");
}

#[test]
fn nfse_taker_variants() {
    let company = nfse_xml().replace("<CPF>12345678901</CPF>", "<CNPJ>98765432000100</CNPJ>");
    let taker = parse_nfse_xml(&company).unwrap().taker.unwrap();
    assert_eq!(taker.document_kind, TakerDocumentKind::Cnpj);
    assert_eq!(taker.document, "98765432000100");

    let foreign = nfse_xml().replace("<CPF>12345678901</CPF>", "<NIF>PT123456789</NIF>");
    let taker = parse_nfse_xml(&foreign).unwrap().taker.unwrap();
    assert_eq!(taker.document_kind, TakerDocumentKind::Nif);

    let anonymous = nfse_xml().replace(
        "<toma>\n      <CPF>12345678901</CPF>\n      <xNome>Maria Silva</xNome>\n    </toma>",
        "",
    );
    assert!(parse_nfse_xml(&anonymous).unwrap().taker.is_none());
}

#[test]
fn nfse_accepts_comma_decimals() {
    let xml = nfse_xml().replace("<vServico>1000.00</vServico>", "<vServico>1000,50</vServico>");
    assert_eq!(parse_nfse_xml(&xml).unwrap().values.service_value, dec!(1000.50));
}

#[test]
fn nfse_rejects_unreadable_amounts() {
    let xml = nfse_xml().replace("<vISS>50.00</vISS>", "<vISS>abc</vISS>");
    assert_eq!(
        parse_nfse_xml(&xml),
        Err(XmlParseError::InvalidDecimal {
            element: "vISS",
            value: "abc".into(),
        })
    );
}

#[test]
fn nfse_without_offset_is_read_as_brasilia_time() {
    let xml = nfse_xml().replace("2024-01-15T10:30:00-03:00", "2024-01-15T10:30:00");
    let issued = parse_nfse_xml(&xml).unwrap().issued_at.unwrap();
    assert_eq!(issued.to_rfc3339(), "2024-01-15T10:30:00-03:00");

    let xml = nfse_xml().replace("2024-01-15T10:30:00-03:00", "2024-01-15");
    let issued = parse_nfse_xml(&xml).unwrap().issued_at.unwrap();
    assert_eq!(issued.to_rfc3339(), "2024-01-15T00:00:00-03:00");
}

#[test]
fn nfse_structure_errors() {
    assert_eq!(parse_nfse_xml(""), Err(XmlParseError::Empty));
    assert_eq!(
        parse_nfse_xml("<DPS/>"),
        Err(XmlParseError::MissingRoot {
            expected: "NFSe",
            found: "DPS".into(),
        })
    );
    assert_eq!(
        parse_nfse_xml("<NFSe><other/></NFSe>"),
        Err(XmlParseError::MissingWrapper("infNFSe"))
    );
    assert!(matches!(
        parse_nfse_xml("<NFSe><infNFSe></NFSe>"),
        Err(XmlParseError::Malformed(_))
    ));
}

#[test]
fn nfse_query_response_shape() {
    let xml = nfse_xml();
    let response = parse_nfse_xml(&xml).unwrap().to_query_response(&xml);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["chave_acesso"], KEY);
    assert_eq!(json["numero"], "42");
    assert_eq!(json["data_emissao"], "2024-01-15T10:30:00-03:00");
    assert_eq!(json["status"], "active");
    assert_eq!(json["prestador"]["documento"], "12345678000199");
    assert_eq!(json["tomador"]["documento"], "12345678901");
    assert_eq!(json["servico"]["local_prestacao"], "São Paulo - SP");
    assert_eq!(json["valores"]["valor_servico"], "1000.00");
    assert_eq!(json["valores"]["aliquota"], "5.00");
    assert_eq!(json["xml"], xml.as_str());
}

#[test]
fn nfse_query_response_omits_zero_tax() {
    let xml = nfse_xml()
        .replace("<pAliq>5.00</pAliq>", "<pAliq>0</pAliq>")
        .replace("<vISS>50.00</vISS>", "");
    let response = parse_nfse_xml(&xml).unwrap().to_query_response(&xml);
    assert!(response.values.rate.is_none());
    assert!(response.values.tax_amount.is_none());

    let json = serde_json::to_value(&response).unwrap();
    assert!(json["valores"].get("aliquota").is_none());
    assert!(json["valores"].get("valor_issqn").is_none());
}

// --- Pre-signed DPS ---

#[test]
fn presigned_fields() {
    let info = parse_presigned_xml(SIGNED_DPS).unwrap();
    assert_eq!(info.dps_id, "DPS355030811234567800019900001000000000123456");
    assert_eq!(info.provider_cnpj.as_deref(), Some("12345678000190"));
    assert_eq!(info.provider_cpf, None);
    assert_eq!(info.provider_id(), Some("12345678000190"));
    assert_eq!(info.provider_name, "Provider Company Ltd");
    assert_eq!(info.municipality_code, "3550308");
    assert_eq!(info.series, "00001");
    assert_eq!(info.number, "123456");
    assert_eq!(info.service_value, Some(dec!(1000.00)));
    assert_eq!(info.environment(), Some(Environment::Homologation));
    assert_eq!(info.national_service_code, "010101");
    assert_eq!(info.service_municipality_code, "3550308");
    assert!(info.has_signature);
    assert!(info.validate().is_empty());
}

#[test]
fn presigned_provider_ids_are_reduced_to_digits() {
    let xml = signed_with(
        "<CNPJ>12345678000190</CNPJ>",
        "<CPF>123.456.789-01</CPF>",
    );
    let info = parse_presigned_xml(&xml).unwrap();
    assert_eq!(info.provider_cpf.as_deref(), Some("12345678901"));
    assert_eq!(info.provider_cnpj, None);
    assert_eq!(info.provider_id(), Some("12345678901"));
}

#[test]
fn presigned_inside_envelope() {
    let wrapped = format!("<envio><lote>{SIGNED_DPS}</lote></envio>");
    let info = parse_presigned_xml(&wrapped).unwrap();
    assert!(info.has_signature);
    assert_eq!(info.number, "123456");
}

#[test]
fn presigned_nested_service_value_with_comma() {
    let xml = signed_with(
        "<vServPrest>1000.00</vServPrest>",
        "<vServPrest><vServ>250,75</vServ></vServPrest>",
    );
    assert_eq!(parse_presigned_xml(&xml).unwrap().service_value, Some(dec!(250.75)));
}

#[test]
fn presigned_unsigned_document_is_flagged() {
    let xml = signed_with(
        r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo/></Signature>"#,
        "",
    );
    let info = parse_presigned_xml(&xml).unwrap();
    assert!(!info.has_signature);
    let problems = info.validate();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, "XML_NOT_SIGNED");
}

#[test]
fn presigned_structure_errors() {
    assert_eq!(
        parse_presigned_xml("<NFSe/>"),
        Err(XmlParseError::MissingRoot {
            expected: "DPS",
            found: "NFSe".into(),
        })
    );
    assert_eq!(
        parse_presigned_xml("<DPS><Signature/></DPS>"),
        Err(XmlParseError::MissingWrapper("infDPS"))
    );
    assert_eq!(
        parse_presigned_xml(&signed_with(
            r#"<infDPS Id="DPS355030811234567800019900001000000000123456">"#,
            "<infDPS>",
        )),
        Err(XmlParseError::MissingIdAttribute("infDPS"))
    );
    assert_eq!(
        parse_presigned_xml(r#"<DPS><infDPS Id="DPS1"><tpAmb>1</tpAmb></infDPS></DPS>"#),
        Err(XmlParseError::MissingProvider)
    );
    assert_eq!(
        parse_presigned_xml(&signed_with("<CNPJ>12345678000190</CNPJ>", "<CNPJ>--</CNPJ>")),
        Err(XmlParseError::MissingProviderId)
    );
}

#[test]
fn presigned_request_decodes_base64() {
    let request = PreSignedXmlRequest {
        xml: STANDARD.encode(SIGNED_DPS),
        webhook_url: None,
    };
    assert_eq!(request.decode_xml().unwrap(), SIGNED_DPS);

    let bad = PreSignedXmlRequest {
        xml: "not base64!".into(),
        webhook_url: None,
    };
    assert!(matches!(bad.decode_xml(), Err(XmlParseError::InvalidBase64(_))));
    assert_eq!(
        NfseError::from(bad.decode_xml().unwrap_err()).code(),
        "INVALID_XML_FORMAT"
    );
}

// --- Submission pipeline ---

#[test]
fn submission_accepts_valid_signed_document() {
    let verifier = MockVerifier::accepting();
    let info = check_presigned_submission(SIGNED_DPS, &verifier).unwrap();
    assert_eq!(info.provider_id(), Some("12345678000190"));
    assert_eq!(verifier.calls.get(), 1);
}

#[test]
fn submission_rejects_unsigned_before_verification() {
    let verifier = MockVerifier::accepting();
    let xml = signed_with(
        r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo/></Signature>"#,
        "",
    );
    let err = check_presigned_submission(&xml, &verifier).unwrap_err();
    assert_eq!(err.code(), "PRESIGNED_VALIDATION_FAILED");
    assert_eq!(err.field_errors()[0].code, "XML_NOT_SIGNED");
    assert_eq!(verifier.calls.get(), 0);
}

#[test]
fn submission_rejects_structural_violations_before_verification() {
    let verifier = MockVerifier::accepting();
    let xml = signed_with("<cTribNac>010101</cTribNac>", "<cTribNac>1</cTribNac>");
    let err = check_presigned_submission(&xml, &verifier).unwrap_err();
    assert_eq!(err.code(), "XSD_VALIDATION_FAILED");
    assert_eq!(err.http_status(), 400);
    assert_eq!(err.field_errors()[0].field, "infDPS/serv/cTribNac");
    assert_eq!(verifier.calls.get(), 0);
}

#[test]
fn submission_reports_verifier_reasons() {
    let verifier = MockVerifier::rejecting(&["digest mismatch"]);
    let err = check_presigned_submission(SIGNED_DPS, &verifier).unwrap_err();
    assert_eq!(err.code(), "SIGNATURE_INVALID");
    assert_eq!(err.field_errors()[0].message, "digest mismatch");

    let silent = MockVerifier::rejecting(&[]);
    match check_presigned_submission(SIGNED_DPS, &silent) {
        Err(NfseError::InvalidSignature(reasons)) => {
            assert_eq!(reasons, ["signature is not valid"]);
        }
        other => panic!("expected signature failure, got {other:?}"),
    }
}

#[test]
fn submission_rejects_unparseable_xml() {
    let verifier = MockVerifier::accepting();
    let err = check_presigned_submission("<DPS>", &verifier).unwrap_err();
    assert_eq!(err.code(), "INVALID_XML_FORMAT");
    assert!(!err.is_retryable());
}
