#![no_main]

use libfuzzer_sys::fuzz_target;
use static_double::source::scanner;
use static_double::{FunctionRewriter, SourceExtractor};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for bounds in scanner::functions(text) {
            assert!(bounds.start < bounds.body_open && bounds.body_open < bounds.body_close);
        }
        if let Ok(source) = SourceExtractor::extract_from_text("fuzz", text) {
            if let Ok(mut rewriter) = FunctionRewriter::from_source(&source, Some("fuzzed")) {
                let _ = rewriter.extract_capture_clause();
                let _ = rewriter.required_parameters();
                let _ = rewriter.render();
            }
        }
    }
});
