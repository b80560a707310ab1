#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // Operator documents must parse or fail cleanly
        let _ = repokit::docstore::parse_filter_json(s);
    }
});
