//! Answer extraction from free-form LLM responses.
//!
//! A response like
//!
//! ```text
//! Using the substitution u = ln(x) ...
//! The final answer is: 1/2*tan(ln(x))^2 + C
//! ```
//!
//! is reduced to `1/2*tan(ln(x))^2 + C`. Each heuristic is a pure function:
//! - [`generators`] propose candidates (keyword, `+ C` line, quotes, last line)
//! - [`postprocess`] keeps the right-hand side of the last `=`
//! - [`validator`] checks that a candidate looks like math, and salvages it if not
//! - [`anchor`] pairs a start keyword with the last `+ C`
//!
//! A [`Plan`] chooses which of these run and in what order; [`Variant`]
//! names the three plans used in experiments. Extraction never fails: a miss
//! is an empty string.

pub mod anchor;
pub mod candidate;
pub mod generators;
pub mod plan;
pub mod postprocess;
pub mod validator;

use std::sync::LazyLock;

use answerlab_shared::Cell;

pub use candidate::{Candidate, Confidence, Strategy};
pub use plan::{Fallback, Miss, Plan, Variant};
pub use postprocess::strip_to_last_equals;
pub use validator::{is_math_expression, salvage};

static STABLE_PLAN: LazyLock<Plan> = LazyLock::new(|| Variant::Stable.plan());

/// Extract an answer with the stable plan. Empty when nothing is found.
pub fn extract_answer(cell_content: &str) -> String {
    STABLE_PLAN
        .extract(cell_content)
        .map(|c| c.text)
        .unwrap_or_default()
}

/// Extract an answer from a workbook cell. Non-text cells yield an empty string.
pub fn extract_cell(cell: &Cell, plan: &Plan) -> String {
    cell.as_text()
        .and_then(|text| plan.extract(text).ok())
        .map(|c| c.text)
        .unwrap_or_default()
}
