use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::error::StorageError;
use crate::sanitize;
use crate::worker::job::Job;

use super::config::PipelineConfig;
use super::context::{PipelineContext, Stage};
use super::convert::{CommandConverter, Converter};
use super::error::PipelineError;
use super::print::{CommandSpooler, Spooler};

/// Convert-then-print sequence for one job.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    converter: Box<dyn Converter>,
    spooler: Box<dyn Spooler>,
}

impl Pipeline {
    /// External converter and spooler, as configured.
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        let converter = CommandConverter::from_config(&config);
        let spooler = CommandSpooler::from_config(&config);
        Self::new(config, Box::new(converter), Box::new(spooler))
    }

    /// Inject specific stage implementations.
    pub fn new(
        config: Arc<PipelineConfig>,
        converter: Box<dyn Converter>,
        spooler: Box<dyn Spooler>,
    ) -> Self {
        Self {
            config,
            converter,
            spooler,
        }
    }

    pub fn work_directory(&self) -> &Path {
        &self.config.work_directory
    }

    /// Run the pipeline for a single job inside a fresh scratch directory.
    ///
    /// Returns the spooler acknowledgement. The scratch directory is removed
    /// before returning, and by its guard if a stage panics.
    pub fn run(&self, job: &Job, ctx: &mut PipelineContext) -> Result<String, PipelineError> {
        let _pipeline_span = info_span!("pipeline",
            job_id = %job.id,
            filename = %job.original_filename,
            format = %job.format,
        )
        .entered();

        ctx.stage = Stage::Staging;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", job.id))
            .tempdir_in(&self.config.work_directory)
            .map_err(|source| StorageError::CreateDirectory {
                path: self.config.work_directory.clone(),
                source,
            })?;
        ctx.scratch_dir = Some(scratch.path().to_path_buf());

        let result = self.run_stages(job, ctx, scratch.path());

        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory for job {}: {}", job.id, e);
        }

        result
    }

    fn run_stages(
        &self,
        job: &Job,
        ctx: &mut PipelineContext,
        scratch: &Path,
    ) -> Result<String, PipelineError> {
        // Step 1: Stage a private copy of the upload
        let staged = {
            let _step = info_span!("stage_input").entered();
            self.step_stage_input(job, scratch)?
        };

        // Step 2: Convert (pass-through for PDFs)
        let pdf = {
            let _step = info_span!("convert").entered();
            ctx.stage = Stage::Converting;
            if job.format.needs_conversion() {
                let pdf = self.converter.convert(&staged, scratch)?;
                debug!("Converted {} to {}", job.original_filename, sanitize::redact_path(&pdf));
                pdf
            } else {
                debug!("{} is already a PDF, skipping conversion", job.original_filename);
                staged
            }
        };
        ctx.pdf_path = Some(pdf.clone());

        // Step 3: Submit to the spooler
        let _step = info_span!("print").entered();
        ctx.stage = Stage::Printing;
        self.spooler
            .submit(&pdf)
            .map_err(PipelineError::PrintFailed)
    }

    fn step_stage_input(&self, job: &Job, scratch: &Path) -> Result<PathBuf, StorageError> {
        // original_filename is already sanitized; sanitize again in case the
        // job was built by hand.
        let mut name = sanitize::secure_filename(&job.original_filename);
        if name.is_empty() {
            name = format!("{}.{}", job.id, job.format.extension());
        }
        let staged = scratch.join(name);

        std::fs::copy(&job.stored_path, &staged).map_err(|source| StorageError::CopyFile {
            from: job.stored_path.clone(),
            to: staged.clone(),
            source,
        })?;

        Ok(staged)
    }
}
