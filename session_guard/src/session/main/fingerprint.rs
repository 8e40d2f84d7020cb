//! Client fingerprint extraction.
//!
//! A fingerprint is an opaque, equality-comparable string built once per
//! request from a fixed, ordered list of header values. It is bound to the
//! session on first touch and compared on every later request; a change
//! means the session id is being presented by a different client.

use http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, HOST, HeaderMap, HeaderName, USER_AGENT, VIA};

const FINGERPRINT_DELIMITER: &str = "|";

// Languages that have no meaningful regional variants; clients oscillate
// between the bare tag and a region-qualified one (e.g. "ja" vs "ja-jp")
// across requests, so the region is collapsed before comparison. Languages
// with genuine variants (en, de, fr, es, pt, zh, ...) keep their region.
const COLLAPSIBLE_LANGS: [&str; 11] = [
    "cs", "da", "fi", "hu", "ja", "ko", "nl", "pl", "ru", "sv", "tr",
];

/// A normalized, comparable summary of the requesting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint(String);

impl ClientFingerprint {
    /// Build the fingerprint for the current request's headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded_for = HeaderName::from_static("x-forwarded-for");
        let forwarded_proto = HeaderName::from_static("x-forwarded-proto");

        let parts = [
            header_lowercase(headers, &USER_AGENT),
            normalize_accept_language(&header_lowercase(headers, &ACCEPT_LANGUAGE)),
            reduce_accept_encoding(&header_lowercase(headers, &ACCEPT_ENCODING)),
            header_lowercase(headers, &HOST),
            header_lowercase(headers, &VIA),
            header_lowercase(headers, &forwarded_for),
            header_lowercase(headers, &forwarded_proto),
        ];

        ClientFingerprint(parts.join(FINGERPRINT_DELIMITER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn into_inner(self) -> String {
        self.0
    }
}

fn header_lowercase(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// accept-encoding is not carried verbatim: less-common tokens vary between
// requests from the same client and would trip false hijack positives. Only
// the presence of the two broadly-supported compression tokens survives.
fn reduce_accept_encoding(value: &str) -> String {
    let mut gzip = false;
    let mut deflate = false;
    for token in value.split(',') {
        let token = token.split(';').next().unwrap_or("").trim();
        match token {
            "gzip" => gzip = true,
            "deflate" => deflate = true,
            _ => {}
        }
    }
    format!("gz{}df{}", u8::from(gzip), u8::from(deflate))
}

fn normalize_accept_language(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    value
        .split(',')
        .map(|entry| {
            let mut pieces = entry.trim().split(';');
            let tag = collapse_region(pieces.next().unwrap_or("").trim());
            let params: Vec<&str> = pieces.collect();
            if params.is_empty() {
                tag.to_string()
            } else {
                format!("{};{}", tag, params.join(";"))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn collapse_region(tag: &str) -> &str {
    match tag.split_once('-') {
        Some((lang, _region)) if COLLAPSIBLE_LANGS.contains(&lang) => lang,
        _ => tag,
    }
}
