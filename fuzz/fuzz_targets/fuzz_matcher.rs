#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use symdex::query::matcher::{prepare_field, ApproximateMatcher, FieldMatcher, Pattern};
use symdex::query::SearchConfig;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    query: &'a str,
    field: &'a str,
    threshold: u8,
}

fuzz_target!(|input: Input| {
    let config = SearchConfig {
        threshold: f64::from(input.threshold) / 255.0,
        ..SearchConfig::default()
    };
    let matcher = ApproximateMatcher::new(&config);
    let Some(pattern) = Pattern::new(input.query) else {
        return;
    };
    let field = prepare_field(input.field);

    if let Some(m) = matcher.match_field(&pattern, &field) {
        assert!(m.distance >= 0.0);
        assert!(m.distance <= config.threshold);
        assert!(m.start + m.len <= field.len());
    }
});
