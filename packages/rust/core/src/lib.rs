//! Batch pipelines for answerlab.
//!
//! This crate applies answer extraction and similarity scoring to whole
//! workbooks: `extract` (raw responses → cleaned answers) and `analyse`
//! (cleaned answers → scores against reference answers).

pub mod analysis;
pub mod pipeline;
