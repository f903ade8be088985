//! Encoding resolution end to end.

use rs_fulltext::extractor::NoFallback;
use rs_fulltext::{ExtractionResult, ExtractionRuleSet, Extractor, Options, PageInput};

fn rules() -> ExtractionRuleSet {
    ExtractionRuleSet {
        body: vec!["//article".into()],
        ..ExtractionRuleSet::default()
    }
}

fn extract(bytes: &[u8], content_type: Option<&str>, options: Options) -> ExtractionResult {
    let input = PageInput {
        bytes,
        content_type,
        url: None,
    };
    Extractor::new(options)
        .with_fallback(NoFallback)
        .process(&input, Some(&rules()))
}

/// UTF-8 content is handled correctly
#[test]
fn utf8_content_handled_correctly() {
    let html = "<html><head><meta charset=\"utf-8\"></head>\
        <body><article><p>Special characters: é, ñ, ü, 中文</p></article></body></html>"
        .as_bytes();

    let result = extract(html, None, Options::default());

    assert_eq!(result.encoding.as_deref(), Some("utf-8"));
    let text = result.body_text().unwrap();
    assert!(text.contains("é, ñ, ü, 中文"));
}

/// ISO-8859-1 declared in the markup is converted to UTF-8
#[test]
fn iso88591_meta_converted_to_utf8() {
    let html = b"<html><head><meta charset=\"ISO-8859-1\"></head>\
        <body><article><p>Caf\xE9 espa\xF1ol M\xFCnchen</p></article></body></html>";

    let result = extract(html, None, Options::default());

    assert_eq!(result.encoding.as_deref(), Some("iso-8859-1"));
    assert_eq!(result.body_text().as_deref(), Some("Café español München"));
}

/// Smart quotes from legacy word processors become typographic characters
#[test]
fn latin1_c1_controls_become_entities() {
    let html = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-1\"></head>\
        <body><article><p>\x93Quoted\x94 \x96 dash\x85</p></article></body></html>";

    let result = extract(html, None, Options::default());

    assert_eq!(result.body_text().as_deref(), Some("\u{201C}Quoted\u{201D} \u{2013} dash\u{2026}"));
}

/// Windows-1252 decodes its own smart quotes without the entity rewrite
#[test]
fn windows1252_decoded_natively() {
    let html = b"<html><head><meta charset=\"windows-1252\"></head>\
        <body><article><p>\x93Hi\x94 \x80</p></article></body></html>";

    let result = extract(html, None, Options::default());

    assert_eq!(result.encoding.as_deref(), Some("windows-1252"));
    assert_eq!(result.body_text().as_deref(), Some("\u{201C}Hi\u{201D} \u{20AC}"));
}

/// Header charsets win over markup declarations
#[test]
fn header_charset_wins() {
    let html = b"<html><head><meta charset=\"utf-8\"></head>\
        <body><article><p>\xC0 la carte</p></article></body></html>";

    let result = extract(html, Some("text/html; charset=\"windows-1252\""), Options::default());

    assert_eq!(result.encoding.as_deref(), Some("windows-1252"));
    assert_eq!(result.body_text().as_deref(), Some("\u{C0} la carte"));
}

/// Misspelled names go through the mistake-correction table
#[test]
fn misspelled_header_charset_corrected() {
    let html = b"<html><body><article><p>Caf\xE9</p></article></body></html>";

    let result = extract(html, Some("text/html; charset=iso-8850-1"), Options::default());

    assert_eq!(result.encoding.as_deref(), Some("iso-8859-1"));
    assert_eq!(result.body_text().as_deref(), Some("Café"));
}

/// Forced encoding overrides everything
#[test]
fn forced_encoding_overrides_header() {
    let html = "<html><body><article><p>Привет</p></article></body></html>";
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(html);
    let options = Options {
        force_encoding: Some("cp1251".to_string()),
        ..Options::default()
    };

    let result = extract(&bytes, Some("text/html; charset=utf-8"), options);

    assert_eq!(result.encoding.as_deref(), Some("windows-1251"));
    assert_eq!(result.body_text().as_deref(), Some("Привет"));
}

/// Disabled detection without other hints means UTF-8
#[test]
fn detection_disabled_defaults_to_utf8() {
    let html = b"<html><head><meta charset=\"iso-8859-1\"></head>\
        <body><article><p>Caf\xE9</p></article></body></html>";
    let options = Options {
        auto_detect_encoding: false,
        ..Options::default()
    };

    let result = extract(html, None, options);

    assert_eq!(result.encoding.as_deref(), Some("utf-8"));
    assert_eq!(result.body_text().as_deref(), Some("Caf\u{FFFD}"));
}

/// Unknown encodings are decoded as UTF-8 without failing
#[test]
fn unknown_declared_encoding_falls_back() {
    let html = b"<html><head><meta charset=\"x-made-up\"></head>\
        <body><article><p>plain text</p></article></body></html>";

    let result = extract(html, None, Options::default());

    assert!(result.success);
    assert_eq!(result.body_text().as_deref(), Some("plain text"));
}
