//! Fuzz testing for helmet option parsing and resolution.
//!
//! Feeds arbitrary JSON text and arbitrary CSP directive maps into the
//! option layer. Every input must end in `Ok` or `Err`, never a panic, and
//! every rule set that resolves must be applicable to a response.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_options
//! cargo +nightly fuzz run fuzz_options -- -max_total_time=60
//! ```

#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use axum::body::Body;
use axum::http::Response;
use helmet_pipeline::helmet::resolve;
use helmet_pipeline::HelmetOptions;
use libfuzzer_sys::fuzz_target;
use serde_json::{json, Value};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// Raw options document
    raw: String,
    /// Directive map for a structured CSP document
    directives: BTreeMap<String, Option<Vec<String>>>,
    use_defaults: bool,
    report_only: bool,
    server_value: Option<String>,
    frame_action: String,
}

fn exercise(options: &HelmetOptions) {
    if let Ok(rules) = resolve(options) {
        let response = rules.apply(Response::new(Body::empty()));
        let _ = rules.apply(response);
    }
}

fuzz_target!(|input: FuzzInput| {
    if let Ok(options) = HelmetOptions::from_json_str(&input.raw) {
        exercise(&options);
    }

    let directives: serde_json::Map<String, Value> = input
        .directives
        .into_iter()
        .map(|(name, values)| (name, values.map_or(Value::Null, |v| json!(v))))
        .collect();

    let structured = json!({
        "contentSecurityPolicy": {
            "directives": directives,
            "useDefaults": input.use_defaults,
            "reportOnly": input.report_only
        },
        "xPoweredBy": { "serverValue": input.server_value },
        "frameguard": { "action": input.frame_action }
    });

    if let Ok(options) = HelmetOptions::from_json_value(structured) {
        exercise(&options);
    }
});
