use nfse_nacional::core::*;

const KEY: &str = "NFSe35503081234567800019900001000000000000001abcde";
const CNPJ_DPS: &str = "355030811234567800019900001000000000000001";
const CPF_DPS: &str = "355030820001234567890100001000000000000042";

// --- Access keys ---

#[test]
fn access_key_accepts_canonical_key() {
    assert_eq!(KEY.len(), ACCESS_KEY_LENGTH);
    assert!(is_valid_access_key(KEY));
    assert_eq!(validate_access_key(KEY), Ok(()));
}

#[test]
fn access_key_tolerates_surrounding_whitespace() {
    let padded = format!("  {KEY}\n");
    assert!(is_valid_access_key(&padded));
    assert_eq!(normalize_access_key(&padded).unwrap(), KEY);
}

#[test]
fn access_key_rules_are_checked_in_order() {
    assert_eq!(validate_access_key(""), Err(AccessKeyError::Empty));
    assert_eq!(validate_access_key("   "), Err(AccessKeyError::Empty));
    assert_eq!(
        validate_access_key("NFSe123"),
        Err(AccessKeyError::WrongLength(7))
    );

    // wrong prefix wins over bad characters
    let bad_prefix = format!("nfse{}", "-".repeat(46));
    assert_eq!(
        validate_access_key(&bad_prefix),
        Err(AccessKeyError::WrongPrefix("nfse".into()))
    );

    let bad_chars = format!("NFSe{}-", "1".repeat(45));
    assert_eq!(
        validate_access_key(&bad_chars),
        Err(AccessKeyError::NonAlphanumeric)
    );
}

#[test]
fn access_key_length_counts_characters() {
    // 50 characters, more than 50 bytes
    let key = format!("NFSe{}é", "1".repeat(45));
    assert_eq!(key.chars().count(), 50);
    assert_eq!(validate_access_key(&key), Err(AccessKeyError::NonAlphanumeric));

    let short = format!("NFSe{}ç", "1".repeat(40));
    assert_eq!(validate_access_key(&short), Err(AccessKeyError::WrongLength(45)));
}

#[test]
fn access_key_is_case_sensitive_on_prefix() {
    let key = KEY.replacen("NFSe", "NFSE", 1);
    assert_eq!(
        validate_access_key(&key),
        Err(AccessKeyError::WrongPrefix("NFSE".into()))
    );
    assert!(normalize_access_key(&key).is_err());
}

#[test]
fn access_key_parses_into_prefix_and_body() {
    let info = parse_access_key(KEY).unwrap();
    assert_eq!(info.prefix, "NFSe");
    assert_eq!(info.body.len(), 46);
    assert_eq!(info.to_string(), KEY);

    let parsed: AccessKeyInfo = KEY.parse().unwrap();
    assert_eq!(parsed, info);
}

// --- DPS identifiers ---

#[test]
fn dps_id_parses_cnpj_identifier() {
    let id = DpsId::parse(CNPJ_DPS).unwrap();
    assert_eq!(id.municipality_code, "3550308");
    assert_eq!(id.registration_type, RegistrationType::Cnpj);
    assert_eq!(id.federal_registration, "12345678000199");
    assert_eq!(id.series, "00001");
    assert_eq!(id.number, "000000000000001");
    assert_eq!(id.cnpj(), Some("12345678000199"));
    assert_eq!(id.cpf(), None);
    assert_eq!(id.to_string(), CNPJ_DPS);
}

#[test]
fn dps_id_parses_cpf_identifier() {
    let id = DpsId::parse(CPF_DPS).unwrap();
    assert_eq!(id.registration_type, RegistrationType::Cpf);
    assert_eq!(id.federal_registration, "00012345678901");
    assert_eq!(id.cpf(), Some("12345678901"));
    assert_eq!(id.cnpj(), None);
    assert_eq!(id.number, "000000000000042");
}

#[test]
fn dps_id_rejects_unknown_registration_type() {
    let id = format!("35503083{}", &CNPJ_DPS[8..]);
    assert_eq!(
        DpsId::parse(&id),
        Err(DpsIdError::UnsupportedRegistrationType("3".into()))
    );
}

#[test]
fn dps_id_requires_cpf_padding() {
    let id = "355030821234567890123400001000000000000001";
    assert_eq!(id.len(), DPS_ID_LENGTH);
    assert_eq!(
        DpsId::parse(id),
        Err(DpsIdError::CpfPadding("12345678901234".into()))
    );
}

#[test]
fn dps_id_shape_errors() {
    assert_eq!(DpsId::parse(""), Err(DpsIdError::Empty));
    assert_eq!(DpsId::parse("123"), Err(DpsIdError::WrongLength(3)));
    let letters = format!("{}A", &CNPJ_DPS[..41]);
    assert_eq!(DpsId::parse(&letters), Err(DpsIdError::NonNumeric));
}

#[test]
fn dps_id_builds_from_components() {
    let id = DpsId::new("3550308", 1, "12.345.678/0001-99", "1", "1").unwrap();
    assert_eq!(id.to_string(), CNPJ_DPS);

    let cpf = DpsId::new("3550308", 2, "123.456.789-01", "1", "42").unwrap();
    assert_eq!(cpf.to_string(), CPF_DPS);
    assert_eq!(cpf.cpf(), Some("12345678901"));
}

#[test]
fn dps_id_builder_reports_malformed_segment() {
    let err = DpsId::new("35503", 1, "12345678000199", "1", "1").unwrap_err();
    assert_eq!(
        err,
        DpsIdError::MalformedSegment {
            segment: DpsSegment::Municipality,
            value: "35503".into(),
        }
    );
    assert_eq!(
        DpsId::new("3550308", 9, "12345678000199", "1", "1"),
        Err(DpsIdError::UnsupportedRegistrationType("9".into()))
    );
    assert!(DpsId::new("3550308", 1, "12345678000199", "123456", "1").is_err());
}

// --- Error taxonomy ---

#[test]
fn identifier_errors_are_permanent_bad_requests() {
    let err = NfseError::from(validate_access_key("NFSe123").unwrap_err());
    assert_eq!(err.code(), "INVALID_ACCESS_KEY");
    assert_eq!(err.http_status(), 400);
    assert!(!err.is_retryable());

    let err = NfseError::from(DpsId::parse("1").unwrap_err());
    assert_eq!(err.code(), "INVALID_DPS_ID");
    assert_eq!(err.http_status(), 400);
}

#[test]
fn query_codes_have_fixed_status_and_retryability() {
    let expected = [
        (QueryErrorCode::InvalidAccessKey, 400, false),
        (QueryErrorCode::InvalidDpsId, 400, false),
        (QueryErrorCode::NfseNotFound, 404, false),
        (QueryErrorCode::DpsNotFound, 404, false),
        (QueryErrorCode::ForbiddenAccess, 403, false),
        (QueryErrorCode::CertificateRequired, 400, false),
        (QueryErrorCode::CertificateInvalid, 400, false),
        (QueryErrorCode::GovernmentUnavailable, 503, true),
        (QueryErrorCode::GovernmentTimeout, 504, true),
    ];
    for (code, status, retryable) in expected {
        assert_eq!(code.http_status(), status, "{code}");
        assert_eq!(code.is_retryable(), retryable, "{code}");

        let err = NfseError::from(QueryError::new(code));
        assert_eq!(err.code(), code.as_str());
        assert_eq!(err.http_status(), status);
        assert_eq!(err.is_retryable(), retryable);
    }
}

#[test]
fn query_error_equality_is_by_code() {
    let a = QueryError::with_message(QueryErrorCode::NfseNotFound, "one");
    let b = QueryError::new(QueryErrorCode::NfseNotFound).with_detail("other");
    assert_eq!(a, b);
    assert_ne!(a, QueryError::new(QueryErrorCode::DpsNotFound));
}

#[test]
fn query_error_from_identifier_error_carries_detail() {
    let err = QueryError::from(AccessKeyError::Empty);
    assert_eq!(err.code, QueryErrorCode::InvalidAccessKey);
    assert_eq!(err.detail.as_deref(), Some("access key is required"));
    assert_eq!(
        err.to_string(),
        "INVALID_ACCESS_KEY: Invalid access key format (access key is required)"
    );
}

#[test]
fn query_error_formats_for_api() {
    let err = QueryError::from_government(QueryErrorCode::GovernmentTimeout, "Q101", "Timeout")
        .with_detail("Retry later");
    let formatted = FormattedQueryError::from(&err);
    assert_eq!(formatted.code, "GOVERNMENT_TIMEOUT");
    assert_eq!(formatted.title, "Timeout");
    assert_eq!(formatted.description, "Retry later");
    assert!(formatted.retryable);
    assert_eq!(formatted.government_code.as_deref(), Some("Q101"));
}

#[test]
fn certificate_errors_distinguish_required_from_invalid() {
    let required = NfseError::Certificate(vec![ValidationError::new(
        "certificate.password",
        "required",
        "Certificate password is required",
    )]);
    assert_eq!(required.code(), "CERTIFICATE_REQUIRED");

    let invalid = NfseError::Certificate(vec![ValidationError::new(
        "certificate.pfx_base64",
        "CERTIFICATE_EXPIRED",
        "certificate has expired",
    )]);
    assert_eq!(invalid.code(), "CERTIFICATE_INVALID");
    assert_eq!(invalid.http_status(), 400);
    assert_eq!(invalid.field_errors().len(), 1);
}

#[test]
fn document_errors_expose_field_errors() {
    let err = NfseError::Document(vec![SchemaViolation {
        code: ViolationCode::MissingElement,
        element: "infDPS/tpAmb".into(),
        message: "required element 'tpAmb' (environment type) not found".into(),
        value: None,
    }]);
    assert_eq!(err.code(), "XSD_VALIDATION_FAILED");
    let fields = err.field_errors();
    assert_eq!(fields[0].field, "infDPS/tpAmb");
    assert_eq!(fields[0].code, "MISSING_ELEMENT");
}

#[test]
fn signature_errors_map_each_reason() {
    let err = NfseError::InvalidSignature(vec!["digest mismatch".into(), "untrusted".into()]);
    assert_eq!(err.code(), "SIGNATURE_INVALID");
    assert_eq!(err.field_errors().len(), 2);
    assert_eq!(
        err.to_string(),
        "signature verification failed: digest mismatch; untrusted"
    );
}

// --- Domain records ---

#[test]
fn environment_codes() {
    assert_eq!(Environment::from_code(1), Some(Environment::Production));
    assert_eq!(Environment::from_code(2), Some(Environment::Homologation));
    assert_eq!(Environment::from_code(3), None);
    assert_eq!(Environment::Homologation.code(), 2);
}

#[test]
fn nfse_status_codes() {
    assert_eq!(NfseStatus::from_code("1"), Some(NfseStatus::Active));
    assert_eq!(NfseStatus::from_code("101"), Some(NfseStatus::Cancelled));
    assert_eq!(NfseStatus::from_code("3"), Some(NfseStatus::Substituted));
    assert_eq!(NfseStatus::from_code("9"), None);
    assert_eq!(NfseStatus::default(), NfseStatus::Active);
}

#[test]
fn presigned_info_reports_every_problem() {
    let info = PreSignedInfo::default();
    let fields: Vec<_> = info.validate().into_iter().map(|e| e.field).collect();
    assert_eq!(fields, ["infDPS.Id", "prest", "tpAmb", "Signature"]);
}

// --- Tax ids and taker identification ---

fn taker(cnpj: Option<&str>, cpf: Option<&str>, nif: Option<&str>) -> TakerIdentification {
    TakerIdentification {
        cnpj: cnpj.map(String::from),
        cpf: cpf.map(String::from),
        nif: nif.map(String::from),
    }
}

fn codes(errors: &[ValidationError]) -> Vec<(&str, &str)> {
    errors.iter().map(|e| (e.field.as_str(), e.code.as_str())).collect()
}

#[test]
fn tax_ids_accept_formatted_and_plain_input() {
    assert!(validate_cnpj("11.222.333/0001-81"));
    assert!(validate_cnpj("11 222 333 0001 81"));
    assert!(validate_cpf("529.982.247-25"));
    assert!(!validate_cnpj("11.222.333/0001-82"));
    assert!(!validate_cpf("111.111.111-11"));
    assert_eq!(format_cnpj(&clean_tax_id("11.222.333/0001-81")), "11.222.333/0001-81");
}

#[test]
fn taker_with_one_valid_identifier_passes() {
    assert!(validate_taker(&taker(Some("11222333000181"), None, None)).is_empty());
    assert!(validate_taker(&taker(None, Some("529.982.247-25"), None)).is_empty());
    assert!(validate_taker(&taker(None, None, Some("PT123456789"))).is_empty());
    // Blank fields do not count as identifiers.
    assert!(validate_taker(&taker(Some("  "), Some(""), Some("ABC1"))).is_empty());
}

#[test]
fn taker_needs_exactly_one_identifier() {
    let none = validate_taker(&taker(None, Some(" "), None));
    assert_eq!(codes(&none), [("taker", "required")]);

    let both = validate_taker(&taker(Some("11222333000181"), Some("52998224725"), None));
    assert_eq!(codes(&both), [("taker", "invalid")]);
    assert!(both[0].message.contains("mutually exclusive"));
}

#[test]
fn taker_identifier_must_be_well_formed() {
    let cnpj = validate_taker(&taker(Some("11222333000182"), None, None));
    assert_eq!(codes(&cnpj), [("taker.cnpj", "invalid")]);

    let cpf = validate_taker(&taker(None, Some("52998224726"), None));
    assert_eq!(codes(&cpf), [("taker.cpf", "invalid")]);

    let long = "A".repeat(NIF_MAX_LENGTH + 1);
    let too_long = validate_taker(&taker(None, None, Some(&long)));
    assert_eq!(codes(&too_long), [("taker.nif", "too_long")]);

    let symbols = validate_taker(&taker(None, None, Some("PT-123 456")));
    assert_eq!(codes(&symbols), [("taker.nif", "invalid_format")]);

    let max = "9".repeat(NIF_MAX_LENGTH);
    assert!(validate_taker(&taker(None, None, Some(&max))).is_empty());
}
