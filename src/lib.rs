//! Structured-content extraction and report reconciliation for the design
//! request assistant.
//!
//! - `parser`: splits an assistant message into prose and typed blocks
//!   (color swatches, tokens, logo references, UX findings, review summaries).
//! - `report`: compares two report snapshots and renders the result.
//! - `config`, `snapshot`, `error`: the file/env edges used by the CLI.

pub mod config;
pub mod error;
pub mod parser;
pub mod report;
pub mod snapshot;

pub use error::{Error, Result};
pub use parser::{extract, extract_with, ExtractOptions, Extraction};
pub use report::{compare, render_document, summarize, Report, ReportComparison};
