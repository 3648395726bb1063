//! Charset discovery from headers and markup
//!
//! Meta scanning works on raw bytes with ASCII-only matching, so it is safe
//! to run before the encoding is known.

/// Number of leading body bytes scanned for a meta declaration
pub const META_SCAN_LIMIT: usize = 4096;

/// Extracts the `charset` parameter from a Content-Type header value
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'').trim();
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Scans the head of a document for a `<meta>` charset declaration
///
/// Both `<meta charset="...">` and
/// `<meta http-equiv="Content-Type" content="text/html; charset=...">` are
/// recognized. Only the first [`META_SCAN_LIMIT`] bytes are examined.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SCAN_LIMIT)];
    let lower: Vec<u8> = head.iter().map(u8::to_ascii_lowercase).collect();

    let mut pos = 0;
    while let Some(offset) = find(&lower[pos..], b"<meta") {
        let start = pos + offset + b"<meta".len();
        let end = lower[start..]
            .iter()
            .position(|&b| b == b'>')
            .map_or(lower.len(), |e| start + e);

        if let Some(label) = charset_in_tag(&lower[start..end]) {
            return Some(label);
        }

        pos = end;
    }

    None
}

fn charset_in_tag(tag: &[u8]) -> Option<String> {
    let idx = find(tag, b"charset")?;
    let mut rest = &tag[idx + b"charset".len()..];

    rest = skip_while(rest, |b| b.is_ascii_whitespace());
    rest = rest.strip_prefix(b"=")?;
    rest = skip_while(rest, |b| b.is_ascii_whitespace() || b == b'"' || b == b'\'');

    let len = rest
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')))
        .unwrap_or(rest.len());

    if len == 0 {
        return None;
    }

    // Only ASCII bytes were accepted above
    String::from_utf8(rest[..len].to_vec()).ok()
}

fn skip_while(bytes: &[u8], pred: impl Fn(u8) -> bool) -> &[u8] {
    let skip = bytes.iter().position(|&b| !pred(b)).unwrap_or(bytes.len());
    &bytes[skip..]
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
