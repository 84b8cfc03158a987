//! Candidate generators.
//!
//! Each generator scans the whole response and proposes at most one
//! candidate. Generators never fail; "nothing found" is `None`.

use std::sync::LazyLock;

use regex::Regex;

use crate::candidate::{Candidate, Strategy};

/// Phrases that introduce a final answer, tried in order.
pub const ANSWER_PHRASES: &[&str] = &[
    r"the final answer is:?",
    r"the solution is:?",
    r"the result is:?",
    r"final expression:?",
    r"final answer\s*=\s*",
];

static PHRASE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ANSWER_PHRASES
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid phrase regex"))
        .collect()
});

/// The `+ C` integration constant, with any spacing.
pub(crate) static TERMINATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\+\s*C").expect("valid regex"));

/// Double- or single-quoted span. Quotes do not nest or mix.
static QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("valid regex"));

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl Strategy {
    /// Run this strategy's generator over `text`.
    pub fn generate(self, text: &str) -> Option<Candidate> {
        match self {
            Strategy::PlusCQuote => plus_c_quote(text),
            Strategy::Keyword => keyword_anchor(text),
            Strategy::Terminator => terminator_anchor(text),
            Strategy::Quote => quote_anchor(text),
            Strategy::LastLine => last_line(text),
            Strategy::Identity => identity(text),
            Strategy::AnchorPair => crate::anchor::anchor_pair(text)
                .map(|expr| Candidate::new(expr, Strategy::AnchorPair)),
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword anchor
// ---------------------------------------------------------------------------

/// First line following the first answer phrase that has a non-empty line
/// after it. Phrases are tried in [`ANSWER_PHRASES`] order, not text order.
pub fn keyword_anchor(text: &str) -> Option<Candidate> {
    PHRASE_RES.iter().find_map(|re| {
        let m = re.find(text)?;
        let first = text[m.end()..].trim().lines().next()?.trim();
        (!first.is_empty()).then(|| Candidate::new(first, Strategy::Keyword))
    })
}

// ---------------------------------------------------------------------------
// Terminator anchor
// ---------------------------------------------------------------------------

/// The line containing the last `+ C`, trimmed.
pub fn terminator_anchor(text: &str) -> Option<Candidate> {
    let last = TERMINATOR_RE.find_iter(text).last()?;
    let line = line_at(text, last.start()).trim();
    (!line.is_empty()).then(|| Candidate::new(line, Strategy::Terminator))
}

/// The line of `text` that starts before byte offset `pos`.
pub(crate) fn line_at(text: &str, pos: usize) -> &str {
    let start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let end = text[start..].find('\n').map_or(text.len(), |i| start + i);
    &text[start..end]
}

// ---------------------------------------------------------------------------
// Quote anchor
// ---------------------------------------------------------------------------

/// All non-empty quoted spans, left to right, without their quotes.
pub fn quoted_spans(text: &str) -> Vec<&str> {
    QUOTE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The last quoted span, trimmed.
pub fn quote_anchor(text: &str) -> Option<Candidate> {
    let quote = quoted_spans(text).pop()?.trim();
    (!quote.is_empty()).then(|| Candidate::new(quote, Strategy::Quote))
}

/// The last quoted span that mentions `+ c` (any case).
pub fn plus_c_quote(text: &str) -> Option<Candidate> {
    let quote = quoted_spans(text)
        .into_iter()
        .rev()
        .find(|q| mentions_plus_c(q))?
        .trim();
    (!quote.is_empty()).then(|| Candidate::new(quote, Strategy::PlusCQuote))
}

/// Literal `+ c` check, case-insensitive. Spacing variants do not count.
pub(crate) fn mentions_plus_c(text: &str) -> bool {
    text.to_lowercase().contains("+ c")
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

/// The last non-empty line, trimmed.
pub fn last_line(text: &str) -> Option<Candidate> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(|line| Candidate::new(line, Strategy::LastLine))
}

/// The whole response, trimmed.
pub fn identity(text: &str) -> Option<Candidate> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| Candidate::new(trimmed, Strategy::Identity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(candidate: Option<Candidate>) -> Option<String> {
        candidate.map(|c| c.text)
    }

    #[test]
    fn keyword_takes_first_line_after_phrase() {
        let text = "The final answer is: 1/2*tan(ln(x))^2 + C";
        assert_eq!(
            text_of(keyword_anchor(text)).as_deref(),
            Some("1/2*tan(ln(x))^2 + C")
        );

        let text = "Working...\nthe solution is\n\n  x^3/3 + C\nThanks for asking";
        assert_eq!(text_of(keyword_anchor(text)).as_deref(), Some("x^3/3 + C"));
    }

    #[test]
    fn keyword_phrase_order_beats_text_order() {
        let text = "The result is: 7\nThe final answer is: 8";
        assert_eq!(text_of(keyword_anchor(text)).as_deref(), Some("8"));
    }

    #[test]
    fn keyword_final_answer_equals() {
        let text = "Final answer = 2x + 1";
        assert_eq!(text_of(keyword_anchor(text)).as_deref(), Some("2x + 1"));
    }

    #[test]
    fn keyword_with_nothing_after_is_skipped() {
        assert_eq!(keyword_anchor("so the final answer is:   \n  "), None);
        assert_eq!(keyword_anchor("no phrase here"), None);
    }

    #[test]
    fn terminator_picks_line_of_last_constant() {
        let text = "First try: x + C\nThen: x^2/2 + c\nDone.";
        let c = terminator_anchor(text).expect("candidate");
        assert_eq!(c.text, "Then: x^2/2 + c");
        assert_eq!(c.strategy, Strategy::Terminator);
    }

    #[test]
    fn terminator_accepts_tight_spacing() {
        assert_eq!(
            text_of(terminator_anchor("F = sin(x)+C")).as_deref(),
            Some("F = sin(x)+C")
        );
        assert_eq!(terminator_anchor("no constant"), None);
    }

    #[test]
    fn quotes_collect_both_kinds_in_order() {
        let text = r#"He said "a" and 'b' then "" and "c d""#;
        assert_eq!(quoted_spans(text), vec!["a", "b", "c d"]);
    }

    #[test]
    fn quote_anchor_returns_last_trimmed() {
        let text = r#"Options: "x + C" or " tan(x) + C ""#;
        assert_eq!(text_of(quote_anchor(text)).as_deref(), Some("tan(x) + C"));
        assert_eq!(quote_anchor("no quotes"), None);
    }

    #[test]
    fn plus_c_quote_filters() {
        let text = r#"We want "x^2 + C" not "the other one""#;
        assert_eq!(text_of(plus_c_quote(text)).as_deref(), Some("x^2 + C"));
        assert_eq!(plus_c_quote(r#""x^2+C""#), None);
    }

    #[test]
    fn last_line_skips_blank_tail() {
        let text = "line one\n  line two  \n\n   \n";
        assert_eq!(text_of(last_line(text)).as_deref(), Some("line two"));
        assert_eq!(last_line("  \n \n"), None);
    }

    #[test]
    fn identity_trims() {
        assert_eq!(text_of(identity("  a\nb  ")).as_deref(), Some("a\nb"));
        assert_eq!(identity("   "), None);
    }

    #[test]
    fn line_at_finds_bounds() {
        let text = "ab\ncd\nef";
        assert_eq!(line_at(text, 4), "cd");
        assert_eq!(line_at(text, 0), "ab");
        assert_eq!(line_at(text, 7), "ef");
    }
}
