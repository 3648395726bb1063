//! Character encoding detection and decoding
//!
//! Listing sites disagree about how (and whether) they announce their charset.
//! The resolver gathers candidate encodings in priority order and decodes with
//! the first one that produces clean text:
//!
//! 1. `charset=` parameter of the Content-Type header
//! 2. Known-hostname hints for sites that mislabel or omit their charset
//! 3. `<meta charset>` declarations in the first few KB of the body
//! 4. UTF-8
//!
//! Decoding never fails. When every candidate produces replacement
//! characters, the highest priority candidate's lossy output is returned.

mod label;
mod sniff;

pub use label::{lookup_label, normalize_label};
pub use sniff::{charset_from_content_type, sniff_meta_charset, META_SCAN_LIMIT};

use encoding_rs::{Encoding, UTF_8};
use url::Url;

/// Where the winning encoding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    Header,
    HostHint,
    Meta,
    ByteOrderMark,
    Default,
}

/// Result of decoding a response body
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
    pub source: CharsetSource,
    /// True if replacement characters were substituted
    pub had_errors: bool,
}

/// Hosts known to serve legacy Japanese encodings without announcing them
const KNOWN_HOSTS: &[(&str, &str)] = &[
    ("item.rakuten.co.jp", "euc-jp"),
    ("kakaku.com", "shift_jis"),
    ("5ch.net", "shift_jis"),
    ("2chan.net", "shift_jis"),
];

/// A hostname suffix bound to a fixed encoding
#[derive(Debug, Clone)]
struct HostHint {
    suffix: String,
    encoding: &'static Encoding,
}

/// Resolves and decodes response bodies
#[derive(Debug, Clone)]
pub struct EncodingResolver {
    host_hints: Vec<HostHint>,
}

impl Default for EncodingResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodingResolver {
    /// Creates a resolver seeded with the built-in host table
    pub fn new() -> Self {
        let mut resolver = Self {
            host_hints: Vec::with_capacity(KNOWN_HOSTS.len()),
        };
        for (host, label) in KNOWN_HOSTS {
            resolver.add_host_hint(host, label);
        }
        resolver
    }

    /// Registers an encoding for a hostname and its subdomains
    ///
    /// Later registrations take precedence over earlier ones and over the
    /// built-in table. Returns false if the label does not name a known
    /// encoding.
    pub fn add_host_hint(&mut self, host: &str, label: &str) -> bool {
        match lookup_label(label) {
            Some(encoding) => {
                self.host_hints.push(HostHint {
                    suffix: host.trim().trim_start_matches('.').to_ascii_lowercase(),
                    encoding,
                });
                true
            }
            None => false,
        }
    }

    /// Looks up the host hint for a URL
    pub fn host_hint(&self, url: &str) -> Option<&'static Encoding> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();

        self.host_hints
            .iter()
            .rev()
            .find(|hint| host == hint.suffix || host.ends_with(&format!(".{}", hint.suffix)))
            .map(|hint| hint.encoding)
    }

    /// Decodes raw bytes to text
    ///
    /// # Arguments
    ///
    /// * `bytes` - The raw response body
    /// * `content_type` - The Content-Type header, if any
    /// * `url` - The URL the body was fetched from, if known
    pub fn decode(&self, bytes: &[u8], content_type: Option<&str>, url: Option<&str>) -> Decoded {
        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            return Decoded {
                text: text.into_owned(),
                encoding,
                source: CharsetSource::ByteOrderMark,
                had_errors,
            };
        }

        let candidates = self.candidates(bytes, content_type, url);
        let mut fallback: Option<Decoded> = None;

        for (encoding, source) in candidates {
            let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
            let decoded = Decoded {
                text: text.into_owned(),
                encoding,
                source,
                had_errors,
            };

            if !had_errors {
                return decoded;
            }

            tracing::trace!(
                "Decoding as {} ({:?}) produced replacement characters",
                encoding.name(),
                source
            );

            if fallback.is_none() {
                fallback = Some(decoded);
            }
        }

        // The candidate list always ends with UTF-8, so a fallback exists
        fallback.unwrap_or_else(|| {
            let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
            Decoded {
                text: text.into_owned(),
                encoding: UTF_8,
                source: CharsetSource::Default,
                had_errors,
            }
        })
    }

    /// Collects candidate encodings in priority order, without duplicates
    fn candidates(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        url: Option<&str>,
    ) -> Vec<(&'static Encoding, CharsetSource)> {
        let mut candidates: Vec<(&'static Encoding, CharsetSource)> = Vec::with_capacity(4);

        let header = content_type
            .and_then(charset_from_content_type)
            .and_then(|label| lookup_label(&label));
        let host = url.and_then(|u| self.host_hint(u));
        let meta = sniff_meta_charset(bytes).and_then(|label| lookup_label(&label));

        for (encoding, source) in [
            (header, CharsetSource::Header),
            (host, CharsetSource::HostHint),
            (meta, CharsetSource::Meta),
            (Some(UTF_8), CharsetSource::Default),
        ] {
            if let Some(encoding) = encoding {
                if !candidates.iter().any(|(e, _)| *e == encoding) {
                    candidates.push((encoding, source));
                }
            }
        }

        candidates
    }
}
