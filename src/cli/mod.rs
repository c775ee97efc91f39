//! CLI support for bindexpr
//!
//! Provides programmatic access to the `bindexpr` command's functionality so
//! other tools can embed it.

mod check;

pub use check::{
    CheckReport, EvalOptions, execute_eval, inspect, render_ast, render_tokens,
};

use std::io;

use thiserror::Error;

use crate::ExprError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Expression(#[from] ExprError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
