pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, validate_config, MAX_TIMEOUT_SECS};
pub use schema::{Config, ConverterConfig, DocumentFormat, HistoryConfig, PrinterConfig};
