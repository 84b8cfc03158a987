//! Two-sided anchor extraction for integral answers.
//!
//! The answer must end at the last `+ C`. Its start is the nearest
//! introducing keyword before it ("is", "get", "=", ...), or the start of
//! that line when no keyword is present.

use std::sync::LazyLock;

use regex::Regex;

use crate::generators::TERMINATOR_RE;

/// Patterns that end right before an expression starts.
const START_ANCHORS: &[&str] = &[
    r"=\s*$",
    r"is\s*:$",
    r"is\s*$",
    r"get\s*$",
    r"have\s*$",
    r"solution is\s*$",
];

static START_ANCHOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    START_ANCHORS
        .iter()
        .map(|p| Regex::new(&format!("(?im){p}")).expect("valid anchor regex"))
        .collect()
});

/// Extract the expression between a start anchor and the last `+ C`.
///
/// Returns `None` when there is no `+ C`, or when what remains after
/// trimming edge punctuation is [noise](is_noise).
pub fn anchor_pair(text: &str) -> Option<String> {
    let end = TERMINATOR_RE.find_iter(text).last()?;
    let search_area = &text[..end.start()];

    let start = START_ANCHOR_RES
        .iter()
        .filter_map(|re| re.find_iter(search_area).last())
        .map(|m| m.end())
        .max()
        .unwrap_or_else(|| search_area.rfind('\n').map_or(0, |i| i + 1));

    let expr = trim_edge_punctuation(text[start..end.end()].trim());
    if is_noise(expr) {
        return None;
    }
    Some(expr.to_string())
}

/// Drop one leading and one trailing `,` or `.` along with adjacent spaces.
fn trim_edge_punctuation(expr: &str) -> &str {
    let expr = expr.strip_prefix([',', '.']).unwrap_or(expr).trim_start();
    expr.strip_suffix([',', '.']).unwrap_or(expr).trim_end()
}

/// Too short to be an answer, or just the constant on its own.
pub fn is_noise(expr: &str) -> bool {
    expr.chars().count() <= 3 || expr.eq_ignore_ascii_case("+ c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_end_anchor() {
        assert_eq!(anchor_pair("The answer is x^2, no constant needed."), None);
        assert_eq!(anchor_pair(""), None);
    }

    #[test]
    fn get_anchor_starts_after_keyword() {
        let text = "Substituting back we get\ny = x^2 + C.";
        assert_eq!(anchor_pair(text).as_deref(), Some("y = x^2 + C"));
    }

    #[test]
    fn equals_anchor_at_line_end() {
        let text = "Integrating term by term:\nF(x) =\n  x^3/3 + C";
        assert_eq!(anchor_pair(text).as_deref(), Some("x^3/3 + C"));
    }

    #[test]
    fn closest_anchor_wins() {
        let text = "The solution is:\nwe have\n2x + C";
        assert_eq!(anchor_pair(text).as_deref(), Some("2x + C"));
    }

    #[test]
    fn falls_back_to_line_start() {
        let text = "Intro paragraph.\nF(x) = tan(x) + C";
        assert_eq!(anchor_pair(text).as_deref(), Some("F(x) = tan(x) + C"));
    }

    #[test]
    fn leading_punctuation_is_stripped() {
        let text = "Thus we get\n, sin(x) + C";
        assert_eq!(anchor_pair(text).as_deref(), Some("sin(x) + C"));
    }

    #[test]
    fn bare_constant_is_noise() {
        assert_eq!(anchor_pair("the result is\n+ C"), None);
        assert_eq!(anchor_pair("x =\n+ c"), None);
        assert!(is_noise("+ C"));
        assert!(is_noise("x+C"));
        assert!(!is_noise("x + C"));
    }
}
