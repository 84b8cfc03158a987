//! Declarative strategy selection.
//!
//! A [`Plan`] lists strategies in precedence order, says whether candidates
//! must pass the math validator, and names what to return when nothing is
//! accepted. [`Variant`] maps the three named extraction modes to plans.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use answerlab_shared::AnswerLabError;

use crate::anchor::is_noise;
use crate::candidate::{Candidate, Strategy};
use crate::generators::{identity, last_line};
use crate::postprocess::strip_to_last_equals;
use crate::validator::{is_math_expression, salvage};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a plan produced no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Miss {
    /// Input was empty or whitespace only.
    #[error("empty or non-text input")]
    MalformedInput,
    /// No strategy proposed a candidate.
    #[error("no candidate found")]
    NoCandidate,
    /// Candidates were found but none passed validation or salvage.
    #[error("no candidate passed validation")]
    ValidationFailed,
}

/// What a plan returns when every strategy misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Report the miss.
    Empty,
    /// The last non-empty line.
    LastLine,
    /// The last non-empty line, else the whole trimmed response.
    LastLineThenIdentity,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// An ordered strategy list plus validation and fallback policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Strategies in precedence order.
    pub strategies: Vec<Strategy>,
    /// Require candidates to pass [`is_math_expression`], salvaging on failure.
    pub validate: bool,
    /// Result when no candidate is accepted.
    pub fallback: Fallback,
}

impl Plan {
    /// Extract an answer from `text`.
    ///
    /// Every candidate goes through [`strip_to_last_equals`] before it is
    /// judged. Without validation the first non-empty result wins. With
    /// validation the first candidate that passes wins; failing that, each
    /// candidate is salvaged in order.
    pub fn extract(&self, text: &str) -> Result<Candidate, Miss> {
        if text.trim().is_empty() {
            return Err(Miss::MalformedInput);
        }

        let outcome = if self.validate {
            self.extract_validated(text)
        } else {
            self.candidates(text).next().ok_or(Miss::NoCandidate)
        };

        match outcome {
            Ok(candidate) => {
                trace!(
                    strategy = %candidate.strategy,
                    salvaged = candidate.salvaged,
                    "candidate accepted"
                );
                Ok(candidate)
            }
            Err(miss) => {
                trace!(%miss, fallback = ?self.fallback, "no candidate accepted");
                self.fall_back(text).ok_or(miss)
            }
        }
    }

    /// Post-processed, accepted candidates in strategy order, generated lazily.
    fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Candidate> + 'a {
        self.strategies.iter().filter_map(move |strategy| {
            let raw = strategy.generate(text)?;
            let processed = strip_to_last_equals(&raw.text);
            let rejected = processed.is_empty()
                || (*strategy == Strategy::AnchorPair && is_noise(processed));
            (!rejected).then(|| raw.with_text(processed))
        })
    }

    fn extract_validated(&self, text: &str) -> Result<Candidate, Miss> {
        let candidates: Vec<Candidate> = self.candidates(text).collect();
        if candidates.is_empty() {
            return Err(Miss::NoCandidate);
        }

        if let Some(valid) = candidates.iter().find(|c| is_math_expression(&c.text)) {
            return Ok(valid.clone());
        }

        candidates
            .iter()
            .find_map(|c| {
                salvage(&c.text).map(|expr| Candidate {
                    salvaged: true,
                    ..c.with_text(expr)
                })
            })
            .ok_or(Miss::ValidationFailed)
    }

    fn fall_back(&self, text: &str) -> Option<Candidate> {
        match self.fallback {
            Fallback::Empty => None,
            Fallback::LastLine => last_line(text),
            Fallback::LastLineThenIdentity => last_line(text).or_else(|| identity(text)),
        }
    }
}

// ---------------------------------------------------------------------------
// Named variants
// ---------------------------------------------------------------------------

/// The three extraction modes used in experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Keyword, `+ C` line, then quotes; never empty for non-blank input.
    #[default]
    Stable,
    /// Only answers that look like math; empty otherwise.
    Maths,
    /// Only `keyword … + C` spans; empty otherwise.
    Integral,
}

impl Variant {
    /// All variants, in CLI listing order.
    pub const ALL: [Variant; 3] = [Variant::Stable, Variant::Maths, Variant::Integral];

    /// The plan this variant runs.
    pub fn plan(self) -> Plan {
        match self {
            Variant::Stable => Plan {
                strategies: vec![
                    Strategy::PlusCQuote,
                    Strategy::Keyword,
                    Strategy::Terminator,
                    Strategy::Quote,
                ],
                validate: false,
                fallback: Fallback::LastLineThenIdentity,
            },
            Variant::Maths => Plan {
                strategies: vec![
                    Strategy::Keyword,
                    Strategy::Terminator,
                    Strategy::Quote,
                    Strategy::LastLine,
                ],
                validate: true,
                fallback: Fallback::Empty,
            },
            Variant::Integral => Plan {
                strategies: vec![Strategy::AnchorPair],
                validate: false,
                fallback: Fallback::Empty,
            },
        }
    }

    /// Suffix added to output file stems so variants do not overwrite each other.
    pub fn output_suffix(self) -> &'static str {
        match self {
            Variant::Stable => "",
            Variant::Maths => "_maths",
            Variant::Integral => "_integral",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Stable => "stable",
            Variant::Maths => "maths",
            Variant::Integral => "integral",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = AnswerLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Variant::Stable),
            "maths" | "math" | "math-validated" => Ok(Variant::Maths),
            "integral" | "integral-anchored" => Ok(Variant::Integral),
            other => Err(AnswerLabError::validation(format!(
                "unknown extraction variant '{other}': expected 'stable', 'maths', or 'integral'"
            ))),
        }
    }
}
