#![no_main]

use libfuzzer_sys::fuzz_target;
use oshsharohi::reveal::counter::{SpecCounter, StatCounter, parse_leading_float, parse_target};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_target(text);
        let _ = parse_leading_float(text);
        if let Some(stat) = StatCounter::parse("stat", text) {
            let _ = stat.value_at(1250.0, 2500.0);
        }
        if let Some(spec) = SpecCounter::parse("spec", text) {
            let frames = spec.frames(60);
            assert_eq!(frames.last().map(String::as_str), Some(text));
        }
    }
});
