//! Library side of the `fj` command line tool.
//!
//! `fj lower` reads a class in the JSON form of `fj-ir`, lowers it and
//! writes an encoded artifact or prints a listing; `fj inspect` decodes and
//! lists an artifact written earlier.

pub mod commands;
pub mod config;
pub mod diagnostics;

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Invalid input: {0}")]
        InvalidInput(String),

        #[error(transparent)]
        Diagnostic(#[from] crate::diagnostics::FjDiagnostic),

        #[error("Lowering failed: {0}")]
        Lowering(#[from] fj_lower::LowerError),

        #[error("Artifact error: {0}")]
        Artifact(#[from] fj_asm::AsmError),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
