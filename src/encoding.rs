//! Character encoding detection and transcoding.
//!
//! Decides which encoding the source bytes are in and converts them to UTF-8.
//! The decision cascade is, first decisive answer wins:
//!
//! 1. a forced encoding from [`Options::force_encoding`]
//! 2. a charset declared in the `Content-Type` response header
//! 3. UTF-8, when [`Options::auto_detect_encoding`] is off
//! 4. the byte-level [`CharsetDetector`], if it names a non-ASCII encoding
//! 5. a charset declared in the markup (XML prolog, then `<meta>` variants)
//! 6. UTF-8
//!
//! Every name goes through [`fix_common_encoding_mistakes`] before use.
//! Nothing in this module fails: unknown codecs decode as UTF-8.

use std::borrow::Cow;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use tracing::{debug, warn};

use crate::options::Options;

/// Canonical name used for the Latin-1 family.
pub const LATIN_1: &str = "iso-8859-1";

/// Match `<?xml version="1.0" encoding="..."?>` prolog
#[allow(clippy::expect_used)]
static XML_PROLOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*<\?xml\s[^>]*encoding\s*=\s*["']\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>;]+)"#).expect("valid regex")
});

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+charset\s*=\s*["']?\s*([^"'\s/>]+)"#).expect("valid regex")
});

/// Match any other `<meta ... charset=...>` attribute
#[allow(clippy::expect_used)]
static ANY_META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([^"'\s/>;]+)"#).expect("valid regex")
});

/// Match `charset=` parameter of a `Content-Type` header value
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*("[^"]*"|'[^']*'|[^;\s]+)"#).expect("valid regex")
});

/// Byte-level encoding guesser.
///
/// Returning `None` means the sample was inconclusive.
pub trait CharsetDetector {
    /// Guess the encoding of a byte sample.
    fn detect(&self, sample: &[u8]) -> Option<String>;
}

/// Default detector: byte-order marks, pure ASCII and UTF-8 validity.
///
/// Legacy single- and multi-byte encodings are left undecided so the markup
/// declaration can settle them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicDetector;

impl CharsetDetector for HeuristicDetector {
    fn detect(&self, sample: &[u8]) -> Option<String> {
        if let Some((encoding, _)) = Encoding::for_bom(sample) {
            return Some(encoding.name().to_ascii_lowercase());
        }

        if sample.is_ascii() {
            return Some("ascii".to_string());
        }

        if Encoding::utf8_valid_up_to(sample) == sample.len() {
            return Some("utf-8".to_string());
        }

        None
    }
}

/// Resolved charset name plus the transcoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingDecision {
    /// Canonical encoding name the bytes were decoded with.
    pub encoding: String,
    /// The document as UTF-8 text.
    pub text: String,
}

/// Resolve the encoding of `bytes` and transcode them with the default detector.
///
/// # Examples
///
/// ```
/// use rs_fulltext::encoding::resolve;
/// use rs_fulltext::Options;
///
/// let html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body>Caf\xE9</body></html>";
/// let decision = resolve(html, None, &Options::default());
/// assert_eq!(decision.encoding, "iso-8859-1");
/// assert!(decision.text.contains("Café"));
/// ```
#[must_use]
pub fn resolve(bytes: &[u8], content_type: Option<&str>, opts: &Options) -> EncodingDecision {
    resolve_with(&HeuristicDetector, bytes, content_type, opts)
}

/// Resolve the encoding of `bytes` with a caller-supplied detector.
#[must_use]
pub fn resolve_with(
    detector: &dyn CharsetDetector,
    bytes: &[u8],
    content_type: Option<&str>,
    opts: &Options,
) -> EncodingDecision {
    let encoding = decide_encoding(detector, bytes, content_type, opts);
    debug!(encoding = %encoding, bytes = bytes.len(), "resolved source encoding");
    let text = transcode(bytes, &encoding);
    EncodingDecision { encoding, text }
}

fn decide_encoding(
    detector: &dyn CharsetDetector,
    bytes: &[u8],
    content_type: Option<&str>,
    opts: &Options,
) -> String {
    if let Some(forced) = opts.force_encoding.as_deref() {
        let fixed = fix_common_encoding_mistakes(forced);
        if !fixed.is_empty() {
            return fixed;
        }
    }

    if let Some(declared) = content_type.and_then(charset_from_content_type) {
        let fixed = fix_common_encoding_mistakes(&declared);
        if is_known_encoding(&fixed) {
            return fixed;
        }
        debug!(charset = %declared, "ignoring unknown header charset");
    }

    if !opts.auto_detect_encoding {
        return "utf-8".to_string();
    }

    let window = &bytes[..bytes.len().min(opts.detect_window)];

    let detected = detector
        .detect(detection_sample(bytes, opts.detect_window))
        .map(|name| fix_common_encoding_mistakes(&name))
        .filter(|name| !name.is_empty());

    match detected.as_deref() {
        Some(name) if !is_ascii_name(name) => return name.to_string(),
        // ASCII is a strict subset of UTF-8, but the markup may still say
        // otherwise, so fall through to the declaration scan.
        _ => {}
    }

    if let Some(declared) = scan_declared_charset(window) {
        let fixed = fix_common_encoding_mistakes(&declared);
        if !fixed.is_empty() {
            return fixed;
        }
    }

    "utf-8".to_string()
}

/// Leading `window` bytes, minus a multi-byte sequence the cut left unfinished.
///
/// Only a truncated window loses its tail; a short document is passed whole.
fn detection_sample(bytes: &[u8], window: usize) -> &[u8] {
    if bytes.len() <= window {
        return bytes;
    }
    let sample = &bytes[..window];
    match std::str::from_utf8(sample) {
        Err(err) if err.error_len().is_none() => &sample[..err.valid_up_to()],
        _ => sample,
    }
}

fn is_ascii_name(name: &str) -> bool {
    matches!(name, "ascii" | "us-ascii" | "ansi_x3.4-1968")
}

fn is_known_encoding(name: &str) -> bool {
    name == LATIN_1 || is_ascii_name(name) || Encoding::for_label(name.as_bytes()).is_some()
}

/// Extract the charset parameter from a `Content-Type` header value.
///
/// Quoted values are unquoted.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    HEADER_CHARSET_RE
        .captures(content_type)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Scan a byte window for a charset declaration in the markup.
///
/// The window is read as ASCII only; any other byte becomes `?` so that
/// multi-byte garbage cannot confuse the patterns.
fn scan_declared_charset(window: &[u8]) -> Option<String> {
    let ascii: String = window
        .iter()
        .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
        .collect();

    [&*XML_PROLOG_RE, &*CONTENT_TYPE_CHARSET_RE, &*META_CHARSET_RE, &*ANY_META_CHARSET_RE]
        .iter()
        .find_map(|re| re.captures(&ascii).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
}

/// Normalize a malformed or legacy encoding name to its canonical form.
///
/// # Examples
///
/// ```
/// use rs_fulltext::encoding::fix_common_encoding_mistakes;
///
/// assert_eq!(fix_common_encoding_mistakes("iso-8850-1"), "iso-8859-1");
/// assert_eq!(fix_common_encoding_mistakes(" Windows "), "windows-1252");
/// ```
#[must_use]
pub fn fix_common_encoding_mistakes(name: &str) -> String {
    let name = name
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_ascii_lowercase();

    let fixed = match name.as_str() {
        "iso-8850-1" | "iso8859-1" | "iso_8859-1" | "iso8859_1" | "iso-8859_1" | "latin1"
        | "latin-1" | "l1" | "iso-latin-1" => LATIN_1,
        "windows" | "win" | "win-1252" | "win1252" | "windows1252" | "cp1252" | "cp-1252"
        | "x-cp1252" => "windows-1252",
        "win-1251" | "win1251" | "windows1251" | "cp1251" | "cp-1251" | "x-cp1251" => {
            "windows-1251"
        }
        "win-1250" | "win1250" | "windows1250" | "cp1250" | "cp-1250" | "x-cp1250" => {
            "windows-1250"
        }
        "unicode" | "utf" | "utf8" | "utf-8" | "none" => "utf-8",
        "x-sjis" | "sjis" | "shift-jis" | "shiftjis" => "shift_jis",
        "x-euc-jp" | "eucjp" => "euc-jp",
        "ks_c_5601" | "ks_c_5601-1987" | "euckr" => "euc-kr",
        "gb_2312-80" | "gb2312-80" => "gb2312",
        _ => return name,
    };
    fixed.to_string()
}

/// Decode `bytes` with the named encoding.
///
/// Unknown names are logged and decoded as UTF-8. Invalid sequences become
/// U+FFFD rather than errors. Latin-1 input gets its C1 control range
/// rewritten into named entities, see [`replace_c1_controls`].
#[must_use]
pub fn transcode(bytes: &[u8], encoding: &str) -> String {
    let name = fix_common_encoding_mistakes(encoding);

    if name == LATIN_1 {
        let decoded = encoding_rs::mem::decode_latin1(bytes);
        return replace_c1_controls(&decoded).into_owned();
    }

    let codec = if is_ascii_name(&name) {
        UTF_8
    } else if let Some(codec) = Encoding::for_label(name.as_bytes()) {
        codec
    } else {
        warn!(encoding = %name, "unknown encoding, decoding as utf-8");
        UTF_8
    };

    let (decoded, _encoding_used, _had_errors) = codec.decode(bytes);
    decoded.into_owned()
}

/// C1 control characters emitted by legacy Western word processors, with
/// the entity for the character they were meant to be.
const C1_ENTITIES: &[(char, &str)] = &[
    ('\u{80}', "&euro;"),
    ('\u{82}', "&sbquo;"),
    ('\u{83}', "&fnof;"),
    ('\u{84}', "&bdquo;"),
    ('\u{85}', "&hellip;"),
    ('\u{86}', "&dagger;"),
    ('\u{87}', "&Dagger;"),
    ('\u{88}', "&circ;"),
    ('\u{89}', "&permil;"),
    ('\u{8A}', "&Scaron;"),
    ('\u{8B}', "&lsaquo;"),
    ('\u{8C}', "&OElig;"),
    ('\u{8E}', "&Zcaron;"),
    ('\u{91}', "&lsquo;"),
    ('\u{92}', "&rsquo;"),
    ('\u{93}', "&ldquo;"),
    ('\u{94}', "&rdquo;"),
    ('\u{95}', "&bull;"),
    ('\u{96}', "&ndash;"),
    ('\u{97}', "&mdash;"),
    ('\u{98}', "&tilde;"),
    ('\u{99}', "&trade;"),
    ('\u{9A}', "&scaron;"),
    ('\u{9B}', "&rsaquo;"),
    ('\u{9C}', "&oelig;"),
    ('\u{9E}', "&zcaron;"),
    ('\u{9F}', "&Yuml;"),
];

/// Rewrite C1 control characters into named HTML entities.
///
/// Only meaningful for text decoded as strict Latin-1.
#[must_use]
pub fn replace_c1_controls(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ('\u{80}'..='\u{9F}').contains(&c)) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match C1_ENTITIES.iter().find(|(from, _)| *from == c) {
            Some((_, entity)) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}
