pub mod config;
pub mod error;
pub mod history;
pub mod intake;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod sanitize;
pub mod service;
pub mod worker;

pub use config::{load_config, Config, DocumentFormat};
pub use error::{ConfigError, IntakeError, Result, StarkError, StorageError, WorkerError};
pub use history::{HistoryEvent, HistoryLedger, JobStatus};
pub use intake::IngestionGate;
pub use pipeline::{Pipeline, PipelineConfig, PipelineError};
pub use process::ProcessError;
pub use service::{HealthReport, PrintService};
pub use worker::{Job, JobQueue, WorkerPool};
