use std::path::PathBuf;

/// Where in the pipeline a job currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Staging,
    Converting,
    Printing,
}

/// Per-job scratch state, owned by the worker so it survives a panic inside
/// the pipeline.
pub struct PipelineContext {
    pub job_id: String,

    pub stage: Stage,

    // Set once the scratch directory exists
    pub scratch_dir: Option<PathBuf>,

    // Set after conversion (or pass-through for PDFs)
    pub pdf_path: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: Stage::Staging,
            scratch_dir: None,
            pdf_path: None,
        }
    }
}
