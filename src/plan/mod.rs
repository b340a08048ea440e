//! Run configuration.
//!
//! Names the text, prompts and output files of a synthesis run so the
//! driver never sees hardcoded paths.

mod run_plan;

pub use run_plan::{
    DAD_SAMPLE_OUTPUT, DAD_SAMPLE_PROMPT, DEFAULT_TEXT, SAMPLE_OUTPUT, SAMPLE_PROMPT,
    SynthesisJob, SynthesisPlan, UNCONDITIONED_OUTPUT,
};
