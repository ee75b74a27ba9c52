use std::sync::Arc;

use nfse_nacional::certificate::{CertificateGate, CertificateRequest};
use nfse_nacional::core::*;
use nfse_nacional::sefin::*;

/// Stands in for a real PKCS#12 backend that only reports untyped messages.
struct OpaqueParser;

impl CertificateParser for OpaqueParser {
    type Info = ();

    fn parse_certificate(&self, _pfx_base64: &str, _password: &str) -> Result<(), ParseFailure> {
        Err(ParseFailure::InvalidFormat("MAC verification failed".into()))
    }

    fn validate_for_signing(&self, _info: &()) -> Result<(), Vec<SigningFailure>> {
        Ok(())
    }
}

fn report(err: &NfseError) {
    println!(
        "  code={} status={} retryable={}",
        err.code(),
        err.http_status(),
        err.is_retryable()
    );
    println!("  message: {}", err);
    for e in err.field_errors() {
        println!("  - {}", e);
    }
}

fn main() {
    // ── 1. Identifier errors convert into NfseError ───────────────────
    println!("=== Identifier Errors ===");
    let err: NfseError = validate_access_key("NFSe123")
        .expect_err("short key must fail")
        .into();
    report(&err);

    let err: NfseError = DpsId::parse("not-a-dps-id").expect_err("garbage must fail").into();
    report(&err);

    // ── 2. Government error codes ─────────────────────────────────────
    println!("\n=== Government Errors ===");
    let registry = Arc::new(CodeRegistry::with_builtin());
    let translator = Translator::new(Arc::clone(&registry));
    for (code, message) in [
        ("Q100", "Servico indisponivel"),
        ("Q020", "NFS-e nao encontrada"),
        ("E002", "Recurso nao encontrado"),
        ("Q110", "Codigo ainda nao catalogado"),
    ] {
        println!("  {} -> category {:?}", code, translator.category(code));
        report(&NfseError::from(translator.to_query_error(code, message)));
    }

    // ── 3. Inconsistent registrations are refused ─────────────────────
    println!("\n=== Registry ===");
    let config = r#"[
        {"code": "Q150", "message": "Manutencao programada", "description": "Scheduled maintenance",
         "action": "Retry later", "category": "service", "retryable": true,
         "mapped_code": "GOVERNMENT_UNAVAILABLE"},
        {"code": "Q151", "message": "Recurso removido", "description": "Removed",
         "action": "Do not retry", "category": "not_found", "retryable": true,
         "mapped_code": "NFSE_NOT_FOUND"}
    ]"#;
    match registry.extend_from_json(config) {
        Ok(n) => println!("  registered {} codes", n),
        Err(e) => println!("  configuration rejected: {}", e),
    }
    println!("  Q150 registered: {}", translator.lookup("Q150").is_some());

    // ── 4. Certificate admission ──────────────────────────────────────
    println!("\n=== Certificate ===");
    let gate = CertificateGate::new(OpaqueParser);
    let result = gate.check(&CertificateRequest::new("AAAA", "secret"));
    if let Err(err) = result.into_result() {
        report(&err);
    }
}
