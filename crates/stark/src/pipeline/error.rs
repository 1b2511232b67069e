use std::path::PathBuf;

use thiserror::Error;

use crate::error::StorageError;
use crate::process::ProcessError;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Converter failed: {0}")]
    Process(#[from] ProcessError),

    #[error("Conversion did not produce PDF: expected {}", expected.display())]
    MissingOutput { expected: PathBuf },
}

impl ConversionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConversionError::Process(e) if e.is_timeout())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),

    #[error("Print failed: {0}")]
    PrintFailed(#[source] ProcessError),

    /// Anything that is not a stage failure, e.g. staging the input.
    #[error("Staging failed: {0}")]
    Storage(#[from] StorageError),
}
