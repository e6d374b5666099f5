//! CLI support for qualex
//!
//! Provides programmatic access to the `qualex` command-line operations so
//! they can be embedded in other tools.

mod check;
mod render;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use render::{RenderCommandOptions, RenderResult, execute_render, parse_param};

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Binding error: {0}")]
    Bind(#[from] crate::BindError),

    #[error("Render error: {0}")]
    Render(#[from] crate::RenderError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Invalid parameter '{0}': expected name=value")]
    InvalidParam(String),
}
