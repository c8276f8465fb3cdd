//! `fj lower`: IR JSON in, class artifact out.

use crate::config::FjConfig;
use crate::diagnostics::{invalid_ir, method_failed, print_diagnostic};
use crate::{CliError, Result};
use clap::Args;
use fj_ir::IrError;
use fj_lower::LowerOptions;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Args)]
pub struct LowerArgs {
    /// Class IR serialized as JSON
    pub input: PathBuf,
    /// Where to write the artifact; defaults to the input with the configured extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Print the lowered class listing
    #[arg(long)]
    pub listing: bool,
    /// Lower methods on worker threads
    #[arg(long)]
    pub parallel: bool,
    /// Abort on the first method that fails to lower
    #[arg(long)]
    pub fail_fast: bool,
    /// Omit line-number entries
    #[arg(long)]
    pub no_line_numbers: bool,
    /// Class-file major version to record in the header
    #[arg(long)]
    pub class_version: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct LowerSummary {
    pub output: PathBuf,
    pub methods: usize,
    /// Names of the methods left out of the class.
    pub failed: Vec<String>,
    pub listing: Option<String>,
}

impl LowerArgs {
    /// Command-line flags only switch options on; they never turn off what
    /// the config enables.
    fn options(&self, config: &FjConfig) -> LowerOptions {
        let mut options = config.lowering.clone();
        options.parallel |= self.parallel;
        options.fail_fast |= self.fail_fast;
        if self.no_line_numbers {
            options.line_numbers = false;
        }
        if let Some(version) = self.class_version {
            options.class_version = version;
        }
        options
    }

    fn output_path(&self, config: &FjConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(&config.output.extension))
    }
}

pub fn lower_command(args: LowerArgs, config: &FjConfig) -> Result<LowerSummary> {
    let class = read_class(&args.input)?;
    let options = args.options(config);
    info!("lowering {} from {}", class.name, args.input.display());

    let lowering = fj_lower::lower_class(&class, &options)?;
    for failure in &lowering.failures {
        warn!("{}", failure.error);
        print_diagnostic(&method_failed(failure));
    }

    let output = args.output_path(config);
    let bytes = fj_asm::encode_file(&lowering.class)?;
    std::fs::write(&output, bytes)?;
    info!(
        "wrote {} ({} methods) to {}",
        lowering.class.header.name,
        lowering.class.methods.len(),
        output.display()
    );

    let listing = (args.listing || config.output.listing)
        .then(|| fj_asm::format_class(&lowering.class));
    Ok(LowerSummary {
        output,
        methods: lowering.class.methods.len(),
        failed: lowering
            .failures
            .into_iter()
            .map(|failure| failure.method)
            .collect(),
        listing,
    })
}

fn read_class(path: &Path) -> Result<fj_ir::Class> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
    })?;
    fj_ir::class_from_json(&text).map_err(|error| match error {
        IrError::Json(json) => invalid_ir(path, &text, &json).into(),
        other => CliError::InvalidInput(other.to_string()),
    })
}
