#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(nfse) = nfse_nacional::dps::parse_nfse_xml(s) {
            let _ = nfse.to_query_response(s);
        }
    }
});
