#![no_main]

use libfuzzer_sys::fuzz_target;
use static_double::ParameterList;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(list) = ParameterList::parse(text) {
            assert!(list.required_count() <= list.len());
            let _ = list.render(false);
        }
    }
});
