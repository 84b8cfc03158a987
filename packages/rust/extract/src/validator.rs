//! Math-expression plausibility check and salvage.
//!
//! The check is deliberately loose: it only has to tell an expression like
//! `1/2*tan(ln(x))^2 + C` apart from a sentence of prose.

use std::sync::LazyLock;

use regex::Regex;

use crate::generators::{TERMINATOR_RE, line_at, mentions_plus_c, quoted_spans};
use crate::postprocess::strip_to_last_equals;

/// Function names counted as math rather than prose.
pub const MATH_FUNCTIONS: &[&str] = &["sin", "cos", "tan", "sec", "csc", "cot", "log", "ln", "exp"];

/// Variable and differential tokens counted as math rather than prose.
pub const MATH_VARIABLES: &[&str] = &[
    "x", "y", "z", "a", "b", "c", "k", "n", "d", "dx", "dy", "dt", "pi", "e",
];

/// More prose words than this rejects a candidate.
const MAX_PROSE_WORDS: usize = 2;

/// Largest allowed share of non-math letters among alphanumerics.
const MAX_PROSE_LETTER_RATIO: f64 = 0.5;

/// Shortest text that can be an expression.
const MIN_EXPRESSION_CHARS: usize = 3;

static MATH_SIGNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)[\d+\-*/^=()\[\]]|{}",
        MATH_FUNCTIONS.join("|")
    ))
    .expect("valid regex")
});

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]+").expect("valid regex"));

fn is_math_token(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    MATH_FUNCTIONS.contains(&lower.as_str()) || MATH_VARIABLES.contains(&lower.as_str())
}

/// A single letter that is itself a whitelisted token (`x`, `c`, `e`, ...).
fn is_math_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() && is_math_token(ch.encode_utf8(&mut [0; 4]))
}

/// Whether `text` plausibly is a mathematical expression.
///
/// All of these must hold:
/// - at least three characters once trimmed
/// - contains a digit, an operator, a bracket, or a function name
/// - at most two alphabetic words outside the math whitelist
/// - at most half of the alphanumeric characters are non-math letters
pub fn is_math_expression(text: &str) -> bool {
    if text.trim().chars().count() < MIN_EXPRESSION_CHARS {
        return false;
    }

    if !MATH_SIGNAL_RE.is_match(text) {
        return false;
    }

    let prose_words = WORD_RE
        .find_iter(text)
        .filter(|w| !is_math_token(w.as_str()))
        .count();
    if prose_words > MAX_PROSE_WORDS {
        return false;
    }

    let alphanumeric = text.chars().filter(|c| c.is_alphanumeric()).count();
    if alphanumeric > 0 {
        let prose_letters = text
            .chars()
            .filter(|&c| c.is_alphabetic() && !is_math_letter(c))
            .count();
        if prose_letters as f64 / alphanumeric as f64 > MAX_PROSE_LETTER_RATIO {
            return false;
        }
    }

    true
}

/// Dig a valid expression out of a candidate that failed validation.
///
/// Tries, in order: quoted spans (last first), the line holding the last
/// `+ C`, and the text after the last `=`. Each attempt is equals-stripped
/// and re-validated.
///
/// [`Plan::extract`](crate::Plan::extract) hands over candidates that are
/// already equals-stripped, so the last step only applies to direct calls.
pub fn salvage(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    let from_quotes = quoted_spans(text)
        .into_iter()
        .rev()
        .map(|q| strip_to_last_equals(q.trim()))
        .find(|q| is_math_expression(q));
    if let Some(expr) = from_quotes {
        return Some(expr.to_string());
    }

    if mentions_plus_c(text) {
        if let Some(last) = TERMINATOR_RE.find_iter(text).last() {
            let expr = strip_to_last_equals(line_at(text, last.start()).trim());
            if is_math_expression(expr) {
                return Some(expr.to_string());
            }
        }
    }

    if text.contains('=') {
        let expr = strip_to_last_equals(text);
        if is_math_expression(expr) {
            return Some(expr.to_string());
        }
    }

    None
}
