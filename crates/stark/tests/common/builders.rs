//! Builders for configs and the shell scripts that stand in for
//! LibreOffice and `lp` during tests.

#![allow(dead_code)]

use std::path::Path;

use stark::config::{Config, ConverterConfig, HistoryConfig, PrinterConfig};

/// Converter script: copies `$3` (the input) to `$2/<stem>.pdf`.
pub const CONVERT_OK: &str = r#"in="$3"; base=$(basename "$in"); cp "$in" "$2/${base%.*}.pdf""#;

/// Converter script that fails the way LibreOffice does on a corrupt file.
pub const CONVERT_FAIL: &str = r#"echo "Error: source file could not be loaded" >&2; exit 1"#;

/// Converter script that exits cleanly without producing a PDF.
pub const CONVERT_NO_OUTPUT: &str = "exit 0";

/// Spooler script that appends the PDF name to `log` and acknowledges.
pub fn spool_to_log(log: &Path) -> String {
    format!(
        r#"basename "$1" >> '{}'; echo "request id is Office-7 (1 file(s))""#,
        log.display()
    )
}

/// Spooler script that never finishes within a one second deadline.
pub const SPOOL_HANG: &str = "sleep 5";

/// Builder for creating `Config` instances that point at test directories.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(upload_dir: &Path, work_dir: &Path) -> Self {
        let config = Config {
            upload_directory: upload_dir.to_string_lossy().into_owned(),
            work_directory: work_dir.to_string_lossy().into_owned(),
            history: HistoryConfig {
                capacity: 200,
                query_limit: 100,
            },
            converter: ConverterConfig {
                command: "sh".to_string(),
                args: sh_args(CONVERT_OK),
                timeout_secs: 10,
            },
            printer: PrinterConfig {
                command: "sh".to_string(),
                args: sh_args("echo ok"),
                name: None,
                timeout_secs: 10,
            },
            ..Config::default()
        };
        Self { config }
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.max_file_size_mb = mb;
        self
    }

    pub fn history(mut self, capacity: usize, query_limit: usize) -> Self {
        self.config.history = HistoryConfig {
            capacity,
            query_limit,
        };
        self
    }

    pub fn converter_script(mut self, script: &str) -> Self {
        self.config.converter.args = sh_args(script);
        self
    }

    pub fn spooler_script(mut self, script: &str) -> Self {
        self.config.printer.args = sh_args(script);
        self
    }

    pub fn print_timeout_secs(mut self, secs: u64) -> Self {
        self.config.printer.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// `sh -c <script> sh`, so the per-job arguments land in `$1`, `$2`, ...
fn sh_args(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string(), "sh".to_string()]
}
