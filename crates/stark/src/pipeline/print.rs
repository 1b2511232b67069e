use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::process::{run_with_deadline, ProcessError};

use super::config::PipelineConfig;

/// Hands a finished PDF to the print system.
pub trait Spooler: Send + Sync {
    /// Returns the spooler's acknowledgement text.
    fn submit(&self, pdf: &Path) -> Result<String, ProcessError>;
}

/// Spooler backed by a CUPS-style `lp` command:
/// `<command> <args..> [-d <printer>] <pdf>`.
pub struct CommandSpooler {
    command: String,
    args: Vec<String>,
    printer: Option<String>,
    timeout: Duration,
}

impl CommandSpooler {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        printer: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            printer,
            timeout,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.print_command.clone(),
            config.print_args.clone(),
            config.printer_name.clone(),
            config.print_timeout,
        )
    }

    fn command_for(&self, pdf: &Path) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        if let Some(printer) = &self.printer {
            cmd.arg("-d").arg(printer);
        }
        cmd.arg(pdf);
        cmd
    }
}

impl Spooler for CommandSpooler {
    fn submit(&self, pdf: &Path) -> Result<String, ProcessError> {
        let output = run_with_deadline(self.command_for(pdf), self.timeout)?;
        Ok(output.stdout.trim().to_string())
    }
}
