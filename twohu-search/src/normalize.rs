//! Text normalization for mixed Chinese/Japanese/English titles.
//!
//! Produces a comparison form: lowercase, canonically decomposed (NFD), with
//! separators turned into spaces, decorative punctuation dropped, and
//! whitespace collapsed. The function is total and idempotent.

use unicode_normalization::UnicodeNormalization;

/// Middle dots and full-width bars, replaced by a single space.
const SEPARATORS: &[char] = &['・', '･', '｜', '·'];

/// Characters dropped outright (not replaced with a space).
const REMOVED: &[char] = &[
    // brackets, CJK and ASCII
    '「', '」', '『', '』', '【', '】', '〔', '〕', '〈', '〉', '《', '》', '（', '）', '(', ')',
    // CJK sentence punctuation
    '！', '？', '｡', '､', '。', '，', '、',
    // tildes
    '~', '～',
    // quotes, straight and curly
    '\'', '"', '`', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
    // hash and percent signs
    '#', '＃', '%', '％',
];

/// Normalize text for search comparison.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let decomposed: String = text.to_lowercase().nfd().collect();
    let mut stripped = String::with_capacity(decomposed.len());
    for c in decomposed.chars() {
        if SEPARATORS.contains(&c) {
            stripped.push(' ');
        } else if !REMOVED.contains(&c) {
            stripped.push(c);
        }
    }

    collapse_whitespace(&stripped)
}

/// Collapse runs of whitespace (full-width space included) to one ASCII space and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Optional-field convenience: a missing field normalizes to the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  Touhou MMD  "), "touhou mmd");
    }

    #[test]
    fn test_empty_and_missing() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize("   　 "), "");
    }

    #[test]
    fn test_separators_become_spaces() {
        assert_eq!(normalize("霊夢・魔理沙"), "霊夢 魔理沙");
        assert_eq!(normalize("東方｜MMD"), "東方 mmd");
        assert_eq!(normalize("a·b"), "a b");
    }

    #[test]
    fn test_brackets_removed_without_space() {
        assert_eq!(normalize("【東方MMD】霊夢"), "東方mmd霊夢");
        assert_eq!(normalize("「魔理沙」(前編)"), "魔理沙前編");
        assert_eq!(normalize("《红楼》〈序〉"), "红楼序");
    }

    #[test]
    fn test_punctuation_quotes_and_symbols_removed() {
        assert_eq!(normalize("ゆっくり！していってね？"), "ゆっくりしていってね");
        assert_eq!(normalize("\"Bad Apple!!\" ～ feat. nomico"), "bad apple!! feat. nomico");
        assert_eq!(normalize("＃12 100％ 'it's'"), "12 100 its");
        assert_eq!(normalize("\u{201C}quoted\u{201D} \u{2018}x\u{2019}"), "quoted x");
    }

    #[test]
    fn test_full_width_space_collapsed() {
        assert_eq!(normalize("東方　　紅魔郷\t\n 2"), "東方 紅魔郷 2");
    }

    #[test]
    fn test_canonical_decomposition() {
        // NFD splits precomposed characters into base + combining mark
        assert_eq!(normalize("Café"), "cafe\u{301}");
        assert_eq!(normalize("ガ"), "カ\u{3099}");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "【東方MMD/中文内嵌】灵梦的日常（前編）",
            "  Bad  Apple!! ～ＰＶ～ ",
            "#1. 霊夢・魔理沙｜「日常」",
            "Café ガ ＃％",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
