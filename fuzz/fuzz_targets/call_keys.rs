#![no_main]

use libfuzzer_sys::fuzz_target;
use static_double::{CallKey, Value};

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        let args = match &json {
            serde_json::Value::Array(items) => items.iter().map(Value::from_json).collect(),
            other => vec![Value::from_json(other)],
        };
        if let Ok(key) = CallKey::canonical(&args) {
            let _ = key.decode();
        }
    }
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = CallKey::Serialized(raw.to_string()).decode();
    }
});
