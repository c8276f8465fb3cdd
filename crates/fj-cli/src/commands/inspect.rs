//! `fj inspect`: prints the listing of a class artifact.

use crate::diagnostics::FjDiagnostic;
use crate::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Artifact written by `fj lower`
    pub input: PathBuf,
}

pub fn inspect_command(args: InspectArgs) -> Result<String> {
    let bytes = std::fs::read(&args.input)?;
    let file = fj_asm::decode_file(&bytes).map_err(|e| FjDiagnostic::BadArtifact {
        path: args.input.display().to_string(),
        reason: e.to_string(),
    })?;
    debug!("artifact version {}", file.version);
    Ok(fj_asm::format_class(&file.class))
}
