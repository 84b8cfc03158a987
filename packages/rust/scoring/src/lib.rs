//! Similarity scoring of extracted answers against reference answers.
//!
//! The default [`MatchingBlocks`] comparator computes a Ratcliff/Obershelp
//! ratio over characters: twice the number of matched characters divided by
//! the combined length. Comparison is case-insensitive. Other comparators
//! plug in through the [`Comparator`] trait.

mod matcher;

use answerlab_shared::Cell;

pub use matcher::similarity_ratio;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Scores how close an answer is to one reference, in `0.0..=1.0`.
pub trait Comparator: Send + Sync {
    /// Similarity of `answer` to `reference`.
    fn score(&self, answer: &str, reference: &str) -> f64;

    /// Human-readable comparator name for tracing.
    fn name(&self) -> &str;
}

/// Case-insensitive character matching-blocks ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingBlocks;

impl Comparator for MatchingBlocks {
    fn score(&self, answer: &str, reference: &str) -> f64 {
        similarity_ratio(&answer.to_lowercase(), &reference.to_lowercase())
    }

    fn name(&self) -> &str {
        "matching-blocks"
    }
}

/// Exact match after trimming and lowercasing: 1.0 or 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl Comparator for ExactMatch {
    fn score(&self, answer: &str, reference: &str) -> f64 {
        if answer.trim().to_lowercase() == reference.trim().to_lowercase() {
            1.0
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "exact"
    }
}

// ---------------------------------------------------------------------------
// Best-of-references scoring
// ---------------------------------------------------------------------------

/// Highest score of `answer` against any reference. 0.0 with no references.
pub fn best_score(comparator: &dyn Comparator, answer: &str, references: &[String]) -> f64 {
    references
        .iter()
        .map(|reference| comparator.score(answer, reference))
        .fold(0.0, f64::max)
}

/// [`best_score`] for a workbook cell. Non-text cells score as empty text.
pub fn score_cell(comparator: &dyn Comparator, cell: &Cell, references: &[String]) -> f64 {
    best_score(comparator, cell.as_text().unwrap_or(""), references)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> Vec<String> {
        vec![
            "1/2*tan(ln(x))^2 + ln(cos(ln(x))) + C".into(),
            "1/2*sec(ln(x))^2 - ln(sec(ln(x))) + C".into(),
        ]
    }

    #[test]
    fn exact_reference_scores_one() {
        let score = best_score(&MatchingBlocks, "1/2*SEC(ln(x))^2 - ln(sec(ln(x))) + c", &refs());
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn best_of_references_is_kept() {
        let answer = "1/2*tan(ln(x))^2 + C";
        let first = MatchingBlocks.score(answer, &refs()[0]);
        let second = MatchingBlocks.score(answer, &refs()[1]);
        let best = best_score(&MatchingBlocks, answer, &refs());
        assert_eq!(best, first.max(second));
        assert!(best > 0.5 && best < 1.0);
    }

    #[test]
    fn no_references_scores_zero() {
        assert_eq!(best_score(&MatchingBlocks, "x + C", &[]), 0.0);
    }

    #[test]
    fn non_text_cell_scores_as_empty() {
        assert_eq!(score_cell(&MatchingBlocks, &Cell::Number(3.0), &refs()), 0.0);
        assert_eq!(score_cell(&MatchingBlocks, &Cell::Empty, &[String::new()]), 1.0);
    }

    #[test]
    fn exact_comparator() {
        assert_eq!(ExactMatch.score(" X + C ", "x + c"), 1.0);
        assert_eq!(ExactMatch.score("x + C", "x - C"), 0.0);
        assert_eq!(ExactMatch.name(), "exact");
    }
}
