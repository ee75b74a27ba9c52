#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Violations are fine, panics are bugs.
        let violations = nfse_nacional::dps::validate_dps(s);
        let _ = nfse_nacional::dps::render_violations(&violations);
        let _ = nfse_nacional::dps::environment_of(s);
    }
});
