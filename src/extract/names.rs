//! Performer and tag name normalization and filtering

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Words that appear in performer fields but are never names
const GENERIC_WORDS: &[&str] = &[
    "---",
    "-",
    "―",
    "なし",
    "無し",
    "不明",
    "その他",
    "他",
    "ほか",
    "素人",
    "出演者",
    "女優",
    "男優",
    "n/a",
    "na",
    "none",
    "unknown",
    "various",
    "others",
    "etc",
    "and more",
];

/// Fragments that mark scraped markup or links rather than a name
const MARKUP_FRAGMENTS: &[&str] = &["://", "www.", "<", ">", "{", "}", "&#", "&amp;", "=\""];

/// Separators between names in a single field; `・` is part of names
const NAME_SEPARATORS: &[char] = &['、', ',', '，', '/', '／', '\n'];

/// Normalizes a name for storage and comparison
///
/// Applies NFKC (full-width/half-width folding) and collapses whitespace.
pub fn normalize_name(raw: &str) -> String {
    let folded: String = raw.nfkc().collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a field holding several names, keeping parenthesized groups intact
pub fn split_names(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in raw.chars() {
        match c {
            '(' | '（' => {
                depth += 1;
                current.push(c);
            }
            ')' | '）' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if depth == 0 && NAME_SEPARATORS.contains(&c) => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Splits `Name (Alias, Alias)` into the display name and its aliases
pub fn split_aliases(raw: &str) -> (String, Vec<String>) {
    let name = normalize_name(raw);
    let Some(open) = name.find('(') else {
        return (name, Vec::new());
    };

    let display = name[..open].trim().to_string();
    let inner = name[open + 1..].trim_end().trim_end_matches(')');
    let aliases = split_names(inner)
        .into_iter()
        .map(|a| normalize_name(&a))
        .filter(|a| !a.is_empty() && *a != display)
        .collect();

    (display, aliases)
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{FF66}'..='\u{FF9F}')
}

/// Rejects strings that cannot be performer names
#[derive(Debug, Clone)]
pub struct NameFilter {
    generic: HashSet<String>,
    max_chars: usize,
}

impl NameFilter {
    /// Creates a filter with the built-in generic words plus site additions
    pub fn new(extra_generic: &[String], max_chars: usize) -> Self {
        let generic = GENERIC_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(extra_generic.iter().map(|w| normalize_name(w)))
            .map(|w| w.to_lowercase())
            .collect();
        Self { generic, max_chars }
    }

    /// Returns true if a normalized name is plausible
    pub fn accepts(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        let mut chars = compact.chars();
        if let (Some(only), None) = (chars.next(), chars.next()) {
            if is_kana(only) {
                return false;
            }
        }

        if name.chars().count() > self.max_chars {
            return false;
        }

        let lower = name.to_lowercase();
        if self.generic.contains(&lower) {
            return false;
        }

        !MARKUP_FRAGMENTS.iter().any(|f| lower.contains(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_folds_width_and_space() {
        assert_eq!(normalize_name("ＡＢＣ　Ｔａｒｏ"), "ABC Taro");
        assert_eq!(normalize_name("  山田   花子 "), "山田 花子");
        assert_eq!(normalize_name("ﾐｻｷ"), "ミサキ");
    }

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names("山田花子、佐藤美咲 / Jane Roe, Ann Poe"),
            vec!["山田花子", "佐藤美咲", "Jane Roe", "Ann Poe"]
        );
        assert_eq!(split_names("マリア・ロッシ"), vec!["マリア・ロッシ"]);
        assert_eq!(split_names("A (B, C), D"), vec!["A (B, C)", "D"]);
        assert!(split_names(" , 、").is_empty());
    }

    #[test]
    fn test_split_aliases() {
        let (name, aliases) = split_aliases("山田花子（山田はな、Hanako）");
        assert_eq!(name, "山田花子");
        assert_eq!(aliases, vec!["山田はな", "Hanako"]);

        let (name, aliases) = split_aliases("Jane Roe");
        assert_eq!(name, "Jane Roe");
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_name_filter() {
        let filter = NameFilter::new(&["Studio Staff".to_string()], 20);

        assert!(filter.accepts("山田花子"));
        assert!(filter.accepts("Jane Roe"));

        assert!(!filter.accepts("12345"));
        assert!(!filter.accepts("あ"));
        assert!(!filter.accepts("ア"));
        assert!(!filter.accepts("不明"));
        assert!(!filter.accepts("Unknown"));
        assert!(!filter.accepts("studio staff"));
        assert!(!filter.accepts("https://alpha.example/actress/1"));
        assert!(!filter.accepts("<span>name</span>"));
        assert!(!filter.accepts("An extremely long string that is not a name"));
        assert!(!filter.accepts("   "));
    }
}
