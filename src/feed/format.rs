use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

/// Upper bound on XML events inspected before the root element must appear.
/// Prologs are a declaration, a doctype and a few comments/PIs at most.
const MAX_PROLOG_EVENTS: usize = 64;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Feed document variants the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    /// RSS 0.9x/2.0 (`<rss>`) or RSS 1.0 (`<rdf:RDF>`)
    Rss,
    /// Atom 1.0 (`<feed>`)
    Atom,
}

impl std::fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedFormat::Rss => f.write_str("rss"),
            FeedFormat::Atom => f.write_str("atom"),
        }
    }
}

/// What the document's root element turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Feed(FeedFormat),
    /// Well-formed prolog, but the root is something else (e.g. `html`)
    UnknownRoot(String),
    /// No root element could be read: not XML, truncated, or empty
    NotXml(String),
}

/// Detects the feed variant by inspecting the first element of the document.
///
/// Only the prolog and root start tag are read, so this is cheap even for
/// large bodies. Namespace prefixes are ignored (`rdf:RDF` matches `RDF`).
///
/// SEC-002: quick-xml never expands `<!ENTITY>` declarations, so a hostile
/// DOCTYPE cannot trigger entity expansion here.
pub fn detect_format(bytes: &[u8]) -> Detection {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    for _ in 0..MAX_PROLOG_EVENTS {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let local = e.local_name();
                return match local.as_ref() {
                    b"rss" | b"RDF" => Detection::Feed(FeedFormat::Rss),
                    b"feed" => Detection::Feed(FeedFormat::Atom),
                    other => Detection::UnknownRoot(String::from_utf8_lossy(other).into_owned()),
                };
            }
            Ok(Event::Text(t)) if !t.iter().all(u8::is_ascii_whitespace) => {
                return Detection::NotXml("text content before root element".to_string());
            }
            Ok(Event::Eof) => return Detection::NotXml("no root element".to_string()),
            Err(e) => return Detection::NotXml(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Detection::NotXml("root element not found in document prolog".to_string())
}
