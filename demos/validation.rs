use nfse_nacional::core::*;
use nfse_nacional::dps::{render_violations, validate_dps};

const DPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DPS xmlns="http://www.sped.fazenda.gov.br/nfse">
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
</DPS>"#;

fn main() {
    // ── 1. Identifiers ────────────────────────────────────────────────
    println!("=== Identifiers ===");
    let key = "NFSe35503081234567800019900001000000000000001abcde";
    match parse_access_key(key) {
        Ok(info) => println!("  access key ok: prefix={} body={}", info.prefix, info.body),
        Err(e) => println!("  access key rejected: {}", e),
    }
    if let Err(e) = validate_access_key("NFSe123") {
        println!("  short access key rejected: {}", e);
    }

    let dps_id = DpsId::parse("355030811234567800019900001000000000000001")
        .expect("DPS id should parse");
    println!(
        "  DPS id: municipality={} registration={} series={} number={}",
        dps_id.municipality_code, dps_id.federal_registration, dps_id.series, dps_id.number
    );

    // ── 2. Tax ids and taker ──────────────────────────────────────────
    println!("\n=== Taker Identification ===");
    for id in ["11.222.333/0001-81", "11.222.333/0001-82", "529.982.247-25"] {
        match classify_tax_id(id) {
            Some((kind, valid)) => println!("  {:<20} {:?} valid={}", id, kind, valid),
            None => println!("  {:<20} not a CPF or CNPJ", id),
        }
    }

    let takers = [
        TakerIdentification {
            cnpj: Some("11222333000181".into()),
            ..Default::default()
        },
        TakerIdentification {
            cnpj: Some("11222333000181".into()),
            cpf: Some("52998224725".into()),
            nif: None,
        },
        TakerIdentification {
            nif: Some("PT-123".into()),
            ..Default::default()
        },
    ];
    for taker in &takers {
        let errors = validate_taker(taker);
        if errors.is_empty() {
            println!("  taker ok");
        }
        for e in &errors {
            println!("  - {}", e);
        }
    }

    // ── 3. Structural validation ──────────────────────────────────────
    println!("\n=== DPS Document ===");
    println!("  {}", render_violations(&validate_dps(DPS)));

    let broken = DPS
        .replacen("<tpAmb>2</tpAmb>", "<tpAmb>3</tpAmb>", 1)
        .replacen("1000.00", "0.00", 1)
        .replacen("<cLocPrest>3550308</cLocPrest>", "", 1);
    let violations = validate_dps(&broken);
    println!("  Found {} violations:", violations.len());
    for v in &violations {
        println!("  - {}", v);
    }
}
