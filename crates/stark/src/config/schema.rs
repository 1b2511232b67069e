use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_upload_directory")]
    pub upload_directory: String,
    #[serde(default = "default_work_directory")]
    pub work_directory: String,
    /// Number of worker threads. 1 keeps print order identical to submission order.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub printer: PrinterConfig,
}

fn default_upload_directory() -> String {
    "/var/lib/stark/uploads".to_string()
}

fn default_work_directory() -> String {
    "/var/lib/stark/work".to_string()
}

fn default_worker_count() -> usize {
    1
}

fn default_max_file_size_mb() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            upload_directory: default_upload_directory(),
            work_directory: default_work_directory(),
            worker_count: default_worker_count(),
            max_file_size_mb: default_max_file_size_mb(),
            history: HistoryConfig::default(),
            converter: ConverterConfig::default(),
            printer: PrinterConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of events retained before the oldest is evicted.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    /// Number of events returned by a history query.
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,
}

fn default_history_capacity() -> usize {
    200
}

fn default_query_limit() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            query_limit: default_query_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_command")]
    pub command: String,
    /// Leading arguments; `--outdir <dir> <input>` is appended per job.
    #[serde(default = "default_converter_args")]
    pub args: Vec<String>,
    #[serde(default = "default_convert_timeout")]
    pub timeout_secs: u64,
}

fn default_converter_command() -> String {
    "libreoffice".to_string()
}

fn default_converter_args() -> Vec<String> {
    ["--headless", "--invisible", "--convert-to", "pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_convert_timeout() -> u64 {
    60
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            command: default_converter_command(),
            args: default_converter_args(),
            timeout_secs: default_convert_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterConfig {
    #[serde(default = "default_print_command")]
    pub command: String,
    /// Extra leading arguments, e.g. `["-o", "media=A4"]`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Destination passed as `-d <name>`; `None` prints to the system default.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_print_timeout")]
    pub timeout_secs: u64,
}

fn default_print_command() -> String {
    "lp".to_string()
}

fn default_print_timeout() -> u64 {
    30
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            command: default_print_command(),
            args: Vec::new(),
            name: None,
            timeout_secs: default_print_timeout(),
        }
    }
}

/// Document types accepted for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 4] = [Self::Pdf, Self::Docx, Self::Pptx, Self::Xlsx];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Format of a filename, judged by its last suffix only.
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn needs_conversion(&self) -> bool {
        !matches!(self, Self::Pdf)
    }

    /// Comma separated list of accepted extensions, for error messages.
    pub fn allowed_list() -> String {
        let mut names: Vec<&str> = Self::ALL.iter().map(|f| f.extension()).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
