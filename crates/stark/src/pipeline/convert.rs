use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use log::debug;

use crate::process::run_with_deadline;

use super::config::PipelineConfig;
use super::error::ConversionError;

/// Turns an office document into a PDF inside `out_dir`.
pub trait Converter: Send + Sync {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError>;
}

/// Converter backed by an external program, LibreOffice by default.
///
/// Invoked as `<command> <args..> --outdir <out_dir> <input>`; the program is
/// expected to write `<out_dir>/<input stem>.pdf`.
pub struct CommandConverter {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.converter_command.clone(),
            config.converter_args.clone(),
            config.convert_timeout,
        )
    }
}

/// Path the converter is expected to produce for `input`.
pub fn expected_pdf_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{}.pdf", stem))
}

impl Converter for CommandConverter {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .current_dir(out_dir);

        let output = run_with_deadline(cmd, self.timeout)?;
        debug!("Converter output: {}", output.stdout.trim());

        let expected = expected_pdf_path(input, out_dir);
        if !expected.is_file() {
            return Err(ConversionError::MissingOutput { expected });
        }

        Ok(expected)
    }
}
