pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod print;
pub mod runner;

pub use config::PipelineConfig;
pub use context::{PipelineContext, Stage};
pub use convert::{CommandConverter, Converter};
pub use error::{ConversionError, PipelineError};
pub use print::{CommandSpooler, Spooler};
pub use runner::Pipeline;
