#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(info) = nfse_nacional::dps::parse_presigned_xml(s) {
            let _ = info.validate();
        }
    }
});
