#![no_main]

use libfuzzer_sys::fuzz_target;
use nfse_nacional::core::{
    DpsId, TakerIdentification, classify_tax_id, normalize_access_key, parse_access_key,
    validate_taker,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = normalize_access_key(s);
        let _ = parse_access_key(s);
        if let Ok(id) = DpsId::parse(s) {
            assert_eq!(DpsId::parse(&id.to_string()).as_ref(), Ok(&id));
        }
        let _ = classify_tax_id(s);
        let _ = validate_taker(&TakerIdentification {
            nif: Some(s.to_string()),
            ..Default::default()
        });
    }
});
