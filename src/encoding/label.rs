//! Encoding label normalization
//!
//! Sites spell charset names in ways the WHATWG label table does not accept
//! (`shift-jis`, `cp932`, `euc_jp`). Labels are folded to a canonical
//! spelling before lookup.

use encoding_rs::Encoding;

/// Spelling variants seen in the wild, mapped to a WHATWG label
const LABEL_ALIASES: &[(&str, &str)] = &[
    ("shift-jis", "shift_jis"),
    ("shiftjis", "shift_jis"),
    ("sjis", "shift_jis"),
    ("x-sjis", "shift_jis"),
    ("cp932", "shift_jis"),
    ("ms932", "shift_jis"),
    ("windows-31j", "shift_jis"),
    ("euc_jp", "euc-jp"),
    ("eucjp", "euc-jp"),
    ("x-euc", "euc-jp"),
    ("x-euc-jp", "euc-jp"),
    ("iso2022jp", "iso-2022-jp"),
    ("iso_2022_jp", "iso-2022-jp"),
    ("utf8", "utf-8"),
    ("utf_8", "utf-8"),
    ("unicode-1-1-utf-8", "utf-8"),
    ("latin1", "windows-1252"),
    ("latin-1", "windows-1252"),
    ("cp1252", "windows-1252"),
];

/// Folds a raw charset label to its canonical spelling
///
/// Surrounding quotes and whitespace are dropped and the label is lowercased.
pub fn normalize_label(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_ascii_lowercase();

    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == cleaned)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(cleaned)
}

/// Resolves a raw label to an encoding, if known
pub fn lookup_label(raw: &str) -> Option<&'static Encoding> {
    let label = normalize_label(raw);
    if label.is_empty() {
        return None;
    }
    Encoding::for_label(label.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{EUC_JP, SHIFT_JIS, UTF_8, WINDOWS_1252};

    #[test]
    fn test_shift_jis_variants() {
        for label in ["Shift_JIS", "shift-jis", "SJIS", "x-sjis", "CP932", "MS932", "Windows-31J"] {
            assert_eq!(lookup_label(label), Some(SHIFT_JIS), "label {}", label);
        }
    }

    #[test]
    fn test_euc_jp_variants() {
        for label in ["EUC-JP", "euc_jp", "eucjp", "x-euc-jp"] {
            assert_eq!(lookup_label(label), Some(EUC_JP), "label {}", label);
        }
    }

    #[test]
    fn test_quoted_and_padded_labels() {
        assert_eq!(lookup_label(" \"UTF8\" "), Some(UTF_8));
        assert_eq!(lookup_label("'latin1'"), Some(WINDOWS_1252));
    }

    #[test]
    fn test_unknown_and_empty_labels() {
        assert_eq!(lookup_label(""), None);
        assert_eq!(lookup_label("\"\""), None);
        assert_eq!(lookup_label("not-a-charset"), None);
    }
}
