//! Debug Report
//!
//! Incremental evidence reports for a debugging session. Each report command
//! appends to one numbered markdown fragment inside an artifact directory;
//! `assemble` later concatenates the fragments in name order, converts them to
//! LaTeX with pandoc, post-processes the result and optionally compiles a PDF.

pub mod assemble;
pub mod assets;
pub mod error;
pub mod fragments;

pub use assemble::{build, publish_pdf, BuildOptions, BuildOutcome};
pub use error::ReportError;
pub use fragments::{Evidence, Hypothesis, ReportDir, TraceRow};

pub type Result<T> = std::result::Result<T, ReportError>;
