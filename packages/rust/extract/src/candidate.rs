//! Candidate answers and the strategies that produce them.

use std::fmt;

/// A heuristic that proposes an answer from a response.
///
/// Strategies are listed in a [`Plan`](crate::Plan) in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Last quoted string containing `+ c`.
    PlusCQuote,
    /// First line after a phrase like "the final answer is".
    Keyword,
    /// Line holding the last `+ C`.
    Terminator,
    /// Last quoted string.
    Quote,
    /// Last non-empty line.
    LastLine,
    /// Whole response, trimmed.
    Identity,
    /// Text between a start keyword and the last `+ C`.
    AnchorPair,
}

impl Strategy {
    /// Confidence class of candidates produced by this strategy.
    pub fn confidence(self) -> Option<Confidence> {
        match self {
            Strategy::Keyword => Some(Confidence::KeywordAnchored),
            Strategy::PlusCQuote | Strategy::Quote => Some(Confidence::QuoteAnchored),
            Strategy::Terminator | Strategy::AnchorPair => Some(Confidence::TerminatorAnchored),
            Strategy::LastLine => Some(Confidence::LineFallback),
            Strategy::Identity => None,
        }
    }

    /// Stable identifier used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::PlusCQuote => "plus-c-quote",
            Strategy::Keyword => "keyword",
            Strategy::Terminator => "terminator",
            Strategy::Quote => "quote",
            Strategy::LastLine => "last-line",
            Strategy::Identity => "identity",
            Strategy::AnchorPair => "anchor-pair",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strongly the text around a candidate points at it being the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    KeywordAnchored,
    QuoteAnchored,
    TerminatorAnchored,
    LineFallback,
}

/// A substring proposed as the answer by one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Proposed answer text.
    pub text: String,
    /// Strategy that found it.
    pub strategy: Strategy,
    /// Set when the text was recovered by salvage after failing validation.
    pub salvaged: bool,
}

impl Candidate {
    pub fn new(text: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            text: text.into(),
            strategy,
            salvaged: false,
        }
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.strategy.confidence()
    }

    /// Same provenance, different text.
    pub(crate) fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            strategy: self.strategy,
            salvaged: self.salvaged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_has_no_confidence() {
        assert_eq!(Strategy::Identity.confidence(), None);
        assert_eq!(
            Candidate::new("x", Strategy::Quote).confidence(),
            Some(Confidence::QuoteAnchored)
        );
    }

    #[test]
    fn strategy_display() {
        assert_eq!(Strategy::AnchorPair.to_string(), "anchor-pair");
        assert_eq!(Strategy::PlusCQuote.to_string(), "plus-c-quote");
    }
}
