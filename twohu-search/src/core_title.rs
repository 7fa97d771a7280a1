//! Core title extraction.
//!
//! Video titles carry decorative prefixes and suffixes: episode numbers,
//! bracketed tag groups such as `【东方MMD】`, and trailing part markers such
//! as `（前編）`. These are described by the [`DECORATIONS`] table and stripped
//! in table order; adding a new marker is a new table row.
//!
//! Extraction works on display-case text. It never lowercases; callers run the
//! result through [`crate::normalize::normalize`] separately.

use once_cell::sync::Lazy;
use regex::Regex;

/// Where a decoration is anchored, and therefore how it is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Matched at the very start of the title, along with trailing whitespace.
    Leading,
    /// Matched at the very end of the title, along with trailing whitespace.
    Trailing,
}

/// One decorative pattern. `pattern` is unanchored; anchoring comes from `removal`.
#[derive(Debug, Clone, Copy)]
pub struct Decoration {
    pub name: &'static str,
    pub pattern: &'static str,
    pub removal: Removal,
}

/// Bracketed tag group: one `[...]`/`【...】` pair with no closing bracket inside.
const BRACKET_TAG: &str = r"[\[【][^】\]]+[\]】]";

/// Decorations in the order they are stripped.
pub const DECORATIONS: &[Decoration] = &[
    Decoration {
        name: "number_prefix",
        pattern: r"[＃#]\s*[0-9]+[.、\s]*",
        removal: Removal::Leading,
    },
    // Two rows so that stacked tag groups like `【A】【B】title` are both absorbed.
    Decoration {
        name: "leading_tag",
        pattern: BRACKET_TAG,
        removal: Removal::Leading,
    },
    Decoration {
        name: "leading_tag_stacked",
        pattern: BRACKET_TAG,
        removal: Removal::Leading,
    },
    Decoration {
        name: "paren_episode_char",
        pattern: r"[(（][前後上中下编篇集合]+[)）]",
        removal: Removal::Trailing,
    },
    Decoration {
        name: "paren_episode_word",
        pattern: r"[(（](?:前編|後編|前篇|后篇|中編|中篇|完結編|解決編|散策編|合集|Easy版|マイルド|メタ回)[)）]",
        removal: Removal::Trailing,
    },
    Decoration {
        name: "bracket_episode_char",
        pattern: r"[\[【][前後上中下编篇集合]+[\]】]",
        removal: Removal::Trailing,
    },
    Decoration {
        name: "bracket_episode_word",
        pattern: r"[\[【](?:前編|後編|前篇|后篇|中編|中篇)[\]】]",
        removal: Removal::Trailing,
    },
    Decoration {
        name: "trailing_tag",
        pattern: BRACKET_TAG,
        removal: Removal::Trailing,
    },
];

impl Decoration {
    fn anchored(&self) -> String {
        match self.removal {
            Removal::Leading => format!(r"^(?:{})\s*", self.pattern),
            Removal::Trailing => format!(r"(?:{})\s*$", self.pattern),
        }
    }
}

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    DECORATIONS
        .iter()
        .map(|d| {
            Regex::new(&d.anchored())
                .unwrap_or_else(|e| panic!("invalid decoration pattern {}: {}", d.name, e))
        })
        .collect()
});

/// Strip decorative prefixes and suffixes, returning the trimmed core title.
///
/// May return an empty string when the whole title is decoration.
pub fn extract_core(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let mut core = title.to_string();
    for re in COMPILED.iter() {
        let stripped = re.replace(&core, "").into_owned();
        core = stripped;
    }
    core.trim().to_string()
}

/// Optional-field convenience: a missing title has an empty core.
pub fn extract_core_opt(title: Option<&str>) -> String {
    title.map(extract_core).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_decorations_compile() {
        assert_eq!(COMPILED.len(), DECORATIONS.len());
    }

    #[test]
    fn test_no_decoration_is_trim() {
        assert_eq!(extract_core("  灵梦的日常 "), "灵梦的日常");
        assert_eq!(extract_core("Bad Apple!!"), "Bad Apple!!");
        assert_eq!(extract_core(""), "");
        assert_eq!(extract_core_opt(None), "");
    }

    #[test]
    fn test_leading_tag() {
        assert_eq!(extract_core("【东方MMD/中文内嵌】灵梦的日常"), "灵梦的日常");
        assert_eq!(extract_core("[MMD] Reimu dance"), "Reimu dance");
    }

    #[test]
    fn test_stacked_leading_tags() {
        assert_eq!(extract_core("【东方MMD】【中文字幕】魔理沙的发明"), "魔理沙的发明");
        assert_eq!(extract_core("【A】 [B] 本編"), "本編");
    }

    #[test]
    fn test_number_prefix() {
        assert_eq!(extract_core("#1 紅魔館の一日"), "紅魔館の一日");
        assert_eq!(extract_core("＃12、幻想郷"), "幻想郷");
        assert_eq!(extract_core("#3. 【東方】霊夢"), "霊夢");
    }

    #[test]
    fn test_single_char_episode_markers() {
        assert_eq!(extract_core("紅魔館の一日（前）"), "紅魔館の一日");
        assert_eq!(extract_core("紅魔館の一日(上下)"), "紅魔館の一日");
        assert_eq!(extract_core("紅魔館の一日【後】"), "紅魔館の一日");
    }

    #[test]
    fn test_word_episode_markers() {
        assert_eq!(extract_core("霊夢の異変解決（完結編）"), "霊夢の異変解決");
        assert_eq!(extract_core("霊夢の異変解決(Easy版)"), "霊夢の異変解決");
        assert_eq!(extract_core("霊夢の異変解決（メタ回）"), "霊夢の異変解決");
        assert_eq!(extract_core("霊夢の異変解決【前編】"), "霊夢の異変解決");
    }

    #[test]
    fn test_trailing_tag() {
        assert_eq!(extract_core("咲夜さんの休日【ＭＭＤ紙芝居】"), "咲夜さんの休日");
        assert_eq!(extract_core("【東方】咲夜さんの休日（後編）【ＭＭＤ紙芝居】 "), "咲夜さんの休日（後編）");
    }

    #[test]
    fn test_inner_brackets_kept() {
        // only decorations anchored at the ends are removed
        assert_eq!(extract_core("霊夢と【魔理沙】の日常"), "霊夢と【魔理沙】の日常");
        assert_eq!(extract_core("Reimu (Remix) Dance"), "Reimu (Remix) Dance");
    }

    #[test]
    fn test_preserves_case() {
        assert_eq!(extract_core("【MMD】Bad APPLE"), "Bad APPLE");
    }

    #[test]
    fn test_fully_decorative_title() {
        assert_eq!(extract_core("【東方MMD】"), "");
        assert_eq!(extract_core("#5 【前編】"), "");
    }
}
