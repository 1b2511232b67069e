use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

pub struct PipelineConfig {
    pub work_directory: PathBuf,
    pub converter_command: String,
    pub converter_args: Vec<String>,
    pub convert_timeout: Duration,
    pub print_command: String,
    pub print_args: Vec<String>,
    pub printer_name: Option<String>,
    pub print_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            work_directory: PathBuf::from(&config.work_directory),
            converter_command: config.converter.command.clone(),
            converter_args: config.converter.args.clone(),
            convert_timeout: Duration::from_secs(config.converter.timeout_secs),
            print_command: config.printer.command.clone(),
            print_args: config.printer.args.clone(),
            printer_name: config.printer.name.clone(),
            print_timeout: Duration::from_secs(config.printer.timeout_secs),
        }
    }
}
