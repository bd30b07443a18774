//! Fuzz member path parsing and numeric format/parse.
//!
//! Arbitrary members must split, normalize and resolve without panicking,
//! and every formatted number must either parse back or report an error.

#![no_main]

use arbitrary::Arbitrary;
use ftui_databind::format::{FormatInfo, format_value, parse_value};
use ftui_databind::{BindingContext, DataSource, MemberPath, PathResolver, Schema, Value, ValueKind};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    member: String,
    format: String,
    culture: u8,
    int: i64,
    float: f64,
    text: String,
}

const CULTURES: &[&str] = &["", "en-US", "en-GB", "fr-FR", "de-DE", "es-ES", "ja-JP"];

fuzz_target!(|input: Input| {
    let path = MemberPath::parse(&input.member);
    assert!(path.full().ends_with(path.field()));
    assert!(path.full().starts_with(path.path()));
    assert_eq!(path.segments().len(), PathResolver::new(&input.member).segments().len());

    let schema = Schema::builder("Node")
        .column("Next", ValueKind::Object)
        .column("Text", ValueKind::Text)
        .build();
    let leaf = schema.new_record();
    if let Ok(root) = schema.record([("Next", Value::Object(leaf))]) {
        let _ = PathResolver::new(&input.member).probe(&Value::Object(root.clone()));
        let _ = BindingContext::new().get_member(&DataSource::object(root), &input.member);
    }

    let info = FormatInfo::for_culture(CULTURES[usize::from(input.culture) % CULTURES.len()]);
    for value in [Value::Int(input.int), Value::Float(input.float)] {
        if let Ok(text) = format_value(&value, &input.format, &info) {
            let _ = parse_value(&text, value.kind(), &input.format, &info);
        }
    }
    let _ = parse_value(&input.text, ValueKind::Float, &input.format, &info);
    let _ = parse_value(&input.text, ValueKind::Int, &input.format, &info);
});
