//! Candidate post-processing.

/// Keep only the right-hand side of the last `=`, trimmed.
///
/// Answers are often phrased as `∫f(x)dx = <answer>`; only the answer is
/// kept. Text without `=` is returned trimmed. Applying this twice gives
/// the same result as applying it once.
pub fn strip_to_last_equals(text: &str) -> &str {
    match text.rsplit_once('=') {
        Some((_, rhs)) => rhs.trim(),
        None => text.trim(),
    }
}
