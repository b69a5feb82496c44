use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// The knowledge-cutoff probe. Sent without a system prompt.
pub const PROBE_QUESTION: &str = "你的知识库截止时间？";

/// Which model the answer points at, judged by the cutoff date it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelLabel {
    Sonnet37,
    Sonnet4,
    Sonnet45,
    Opus45,
    Unknown,
}

impl ModelLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelLabel::Sonnet37 => "Claude Sonnet 3.7",
            ModelLabel::Sonnet4 => "Claude Sonnet 4",
            ModelLabel::Sonnet45 => "Claude Sonnet 4.5",
            ModelLabel::Opus45 => "Claude Opus 4.5",
            ModelLabel::Unknown => "unknown model",
        }
    }

    pub fn is_known(self) -> bool {
        self != ModelLabel::Unknown
    }
}

impl fmt::Display for ModelLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cutoff phrase and the model it identifies, for operator-facing hints.
pub const CUTOFF_HINTS: &[(&str, ModelLabel)] = &[
    ("2024-10 (October 2024)", ModelLabel::Sonnet37),
    ("2025-01 (January 2025)", ModelLabel::Sonnet4),
    ("2024-04 (April 2024)", ModelLabel::Sonnet45),
    ("2025-04 (April 2025)", ModelLabel::Opus45),
];

// Chinese phrasings first, then English; the first hit wins.
const RULES: &[(&str, ModelLabel)] = &[
    (r"2024\s*年?\s*10\s*月", ModelLabel::Sonnet37),
    (r"2025\s*年?\s*1\s*月", ModelLabel::Sonnet4),
    (r"2024\s*年?\s*4\s*月", ModelLabel::Sonnet45),
    (r"2025\s*年?\s*4\s*月", ModelLabel::Opus45),
    (r"October\s*2024", ModelLabel::Sonnet37),
    (r"January\s*2025", ModelLabel::Sonnet4),
    (r"April\s*2024", ModelLabel::Sonnet45),
    (r"April\s*2025", ModelLabel::Opus45),
];

static PATTERNS: Lazy<Vec<(Regex, ModelLabel)>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|(pattern, label)| {
            let regex = Regex::new(&format!("(?i){pattern}")).expect("regex should compile");
            (regex, *label)
        })
        .collect()
});

/// Classify an answer by the first cutoff phrase it contains.
pub fn detect_model(text: &str) -> ModelLabel {
    PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, label)| *label)
        .unwrap_or(ModelLabel::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_and_english_phrasings_agree() {
        assert_eq!(detect_model("我的知识截止到2024年10月。"), ModelLabel::Sonnet37);
        assert_eq!(
            detect_model("my knowledge runs until october 2024"),
            ModelLabel::Sonnet37
        );
        assert_eq!(detect_model("2025 年 1 月"), ModelLabel::Sonnet4);
        assert_eq!(detect_model("JANUARY 2025"), ModelLabel::Sonnet4);
        assert_eq!(detect_model("截至 2024年4月"), ModelLabel::Sonnet45);
        assert_eq!(detect_model("April 2024."), ModelLabel::Sonnet45);
        assert_eq!(detect_model("2025年4月"), ModelLabel::Opus45);
        assert_eq!(detect_model("up to April2025"), ModelLabel::Opus45);
    }

    #[test]
    fn optional_year_marker() {
        assert_eq!(detect_model("2024 10月"), ModelLabel::Sonnet37);
    }

    #[test]
    fn two_digit_month_does_not_match_single_digit_rule() {
        assert_eq!(detect_model("2025年10月"), ModelLabel::Unknown);
        assert_eq!(detect_model("2024年11月"), ModelLabel::Unknown);
    }

    #[test]
    fn unmatched_text_is_unknown() {
        assert_eq!(detect_model(""), ModelLabel::Unknown);
        assert_eq!(detect_model("I cannot say."), ModelLabel::Unknown);
        assert_eq!(detect_model("early 2024"), ModelLabel::Unknown);
        assert!(!detect_model("2023年").is_known());
    }

    #[test]
    fn table_order_breaks_ties() {
        let text = "April 2025, or perhaps 2024年10月";
        assert_eq!(detect_model(text), ModelLabel::Sonnet37);
    }

    #[test]
    fn labels_render_names() {
        assert_eq!(ModelLabel::Opus45.to_string(), "Claude Opus 4.5");
        assert_eq!(CUTOFF_HINTS.len(), 4);
    }
}
