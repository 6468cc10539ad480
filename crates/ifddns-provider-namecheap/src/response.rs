//! Decoding of the park-your-domain XML acknowledgment
//!
//! A successful update looks like:
//!
//! ```xml
//! <?xml version="1.0"?>
//! <interface-response>
//!     <Command>SETDNSHOST</Command>
//!     <Language>eng</Language>
//!     <IP>198.51.100.7</IP>
//!     <ErrCount>0</ErrCount>
//!     <ResponseCount>0</ResponseCount>
//!     <Done>true</Done>
//!     <debug><![CDATA[]]></debug>
//! </interface-response>
//! ```
//!
//! A refusal carries `ErrCount > 0`, the reason in `errors/Err1` and
//! usually a longer explanation in `responses/response/ResponseString`.
//!
//! The endpoint has historically answered in UTF-16, sometimes with a BOM,
//! sometimes only announced in the XML declaration, and sometimes with a
//! declaration claiming UTF-16 over plain ASCII bytes.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

/// How many leading bytes are inspected for NULs when sniffing UTF-16
const SNIFF_LEN: usize = 64;

/// The `<interface-response>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InterfaceResponse {
    /// Address the provider recorded
    #[serde(rename = "IP", default)]
    pub ip: Option<String>,

    /// Number of errors; anything above zero is a refusal
    #[serde(rename = "ErrCount")]
    pub err_count: u32,

    /// Error list, present when `ErrCount` is non-zero
    #[serde(rename = "errors", default)]
    pub errors: Option<Errors>,

    /// Number of entries under `responses`
    #[serde(rename = "ResponseCount", default)]
    pub response_count: u32,

    /// Longer explanations accompanying the errors
    #[serde(rename = "responses", default)]
    pub responses: Option<Responses>,

    /// Whether the command ran to completion
    #[serde(rename = "Done", default)]
    pub done: bool,
}

/// The `<errors>` element
///
/// The endpoint only ever fills `Err1` for a single-host update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Errors {
    /// Short reason for the refusal
    #[serde(rename = "Err1", default)]
    pub err1: Option<String>,
}

/// The `<responses>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Responses {
    #[serde(rename = "response", default)]
    pub response: Vec<ResponseEntry>,
}

/// One `<response>` under `<responses>`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseEntry {
    /// Human-readable explanation
    #[serde(rename = "ResponseString", default)]
    pub response_string: Option<String>,
}

impl InterfaceResponse {
    /// Parse a decoded document
    pub fn parse(text: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(text)
    }

    /// Whether the provider refused the update
    pub fn is_error(&self) -> bool {
        self.err_count > 0
    }

    /// The provider's reason for refusing, verbatim
    ///
    /// `Err1` if present, else the first `ResponseString`.
    pub fn error_message(&self) -> String {
        let err1 = self
            .errors
            .as_ref()
            .and_then(|e| e.err1.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let first_response = || {
            self.responses
                .as_ref()
                .and_then(|r| r.response.iter().find_map(|e| e.response_string.as_deref()))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        match err1.or_else(first_response) {
            Some(message) => message.to_string(),
            None => format!("{} error(s) reported without a message", self.err_count),
        }
    }
}

/// Decode a response body to text
///
/// In order of precedence: a byte-order mark, the encoding named in an
/// ASCII-readable XML declaration, NUL bytes betraying UTF-16, and finally
/// UTF-8. Malformed sequences become U+FFFD.
pub fn decode_body(bytes: &[u8]) -> String {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (detect_encoding(bytes), bytes),
    };

    let (text, _had_errors) = encoding.decode_without_bom_handling(body);
    text.into_owned()
}

fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some(encoding) = declared_encoding(bytes) {
        // Readable as ASCII means it isn't really UTF-16.
        return encoding.output_encoding();
    }

    sniff_utf16(bytes).unwrap_or(UTF_8)
}

/// The encoding named by `<?xml ... encoding="..."?>`, if readable as ASCII
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut reader = Reader::from_reader(bytes);

    loop {
        match reader.read_event() {
            Ok(Event::Decl(decl)) => {
                let label = decl.encoding()?.ok()?;
                return Encoding::for_label(&label);
            }
            Ok(Event::Text(text)) if text.iter().all(u8::is_ascii_whitespace) => continue,
            _ => return None,
        }
    }
}

/// UTF-16 without a BOM shows NULs in every other byte of ASCII markup
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if !head.contains(&0) {
        return None;
    }

    match head {
        [0, b, ..] if *b != 0 => Some(UTF_16BE),
        [a, 0, ..] if *a != 0 => Some(UTF_16LE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS: &str = r#"<?xml version="1.0" encoding="utf-16"?>
<interface-response>
    <Command>SETDNSHOST</Command>
    <Language>eng</Language>
    <IP>198.51.100.7</IP>
    <ErrCount>0</ErrCount>
    <ResponseCount>0</ResponseCount>
    <Done>true</Done>
    <debug><![CDATA[]]></debug>
</interface-response>"#;

    const REJECTED: &str = r#"<?xml version="1.0"?>
<interface-response>
    <Command>SETDNSHOST</Command>
    <Language>eng</Language>
    <ErrCount>1</ErrCount>
    <errors>
        <Err1>Passwords do not match</Err1>
    </errors>
    <ResponseCount>1</ResponseCount>
    <responses>
        <response>
            <ResponseNumber>304156</ResponseNumber>
            <ResponseString>Validation error; invalid ; password</ResponseString>
        </response>
    </responses>
    <Done>true</Done>
</interface-response>"#;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut out = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
        out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        out
    }

    fn utf16be(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_be_bytes).collect()
    }

    #[test]
    fn test_parse_success() {
        let response = InterfaceResponse::parse(SUCCESS).unwrap();
        assert!(!response.is_error());
        assert!(response.done);
        assert_eq!(response.ip.as_deref(), Some("198.51.100.7"));
    }

    #[test]
    fn test_parse_rejection() {
        let response = InterfaceResponse::parse(REJECTED).unwrap();
        assert!(response.is_error());
        assert_eq!(response.response_count, 1);
        assert_eq!(response.error_message(), "Passwords do not match");
    }

    #[test]
    fn test_rejection_falls_back_to_response_string() {
        let text = "<interface-response><ErrCount>1</ErrCount>\
            <responses><response><ResponseString>Domain name not found</ResponseString></response></responses>\
            </interface-response>";
        let response = InterfaceResponse::parse(text).unwrap();
        assert_eq!(response.error_message(), "Domain name not found");

        let bare = InterfaceResponse::parse("<interface-response><ErrCount>2</ErrCount></interface-response>")
            .unwrap();
        assert!(bare.error_message().contains('2'));
    }

    #[test]
    fn test_missing_err_count_is_an_error() {
        assert!(InterfaceResponse::parse("<interface-response><Done>true</Done></interface-response>").is_err());
        assert!(InterfaceResponse::parse("<html><body>502 Bad Gateway</body></html>").is_err());
    }

    #[test]
    fn test_decode_utf16le_with_bom() {
        assert_eq!(decode_body(&utf16le(SUCCESS, true)), SUCCESS);
    }

    #[test]
    fn test_decode_utf16_without_bom() {
        assert_eq!(decode_body(&utf16le(REJECTED, false)), REJECTED);
        assert_eq!(decode_body(&utf16be(REJECTED)), REJECTED);
    }

    #[test]
    fn test_utf16_label_over_ascii_is_utf8() {
        // SUCCESS declares utf-16 but these bytes are plain UTF-8
        assert_eq!(decode_body(SUCCESS.as_bytes()), SUCCESS);
    }

    #[test]
    fn test_declared_legacy_encoding() {
        let mut body = b"<?xml version='1.0' encoding='ISO-8859-1'?><interface-response><Err1>caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(b"</Err1></interface-response>");

        assert!(decode_body(&body).contains("café"));
    }

    #[test]
    fn test_decode_plain_ascii() {
        assert_eq!(decode_body(REJECTED.as_bytes()), REJECTED);
        assert_eq!(decode_body(b""), "");
    }
}
