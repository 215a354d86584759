#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Stripping must never panic, and valid JSON must stay valid
    let stripped = symdex::utils::strip_jsonc(data);
    if serde_json::from_str::<serde_json::Value>(data).is_ok() {
        assert!(serde_json::from_str::<serde_json::Value>(&stripped).is_ok());
    }
});
