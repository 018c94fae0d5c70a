//! Export options

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where exported files go and how they are named
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output directory; must exist
    pub out_dir: PathBuf,
    /// Prepended to every output file name
    pub prefix: String,
    /// Settings used by the CSV exporter
    pub csv: CsvExportOptions,
}

impl ExportOptions {
    /// Options writing into `out_dir` with no prefix
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Default::default()
        }
    }

    /// Set the file name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// `<out_dir>/<prefix><sheet>.<extension>`
    pub fn output_path(&self, sheet: &str, extension: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}{}.{}", self.prefix, sheet, extension))
    }
}

/// Output format of the data exporters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Yaml,
}

impl ExportFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }

    /// Map a format name; anything unrecognised means CSV.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => ExportFormat::Json,
            "yaml" => ExportFormat::Yaml,
            _ => ExportFormat::Csv,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// Options for writing CSV files
#[derive(Debug, Clone)]
pub struct CsvExportOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Write the column-name header row
    pub write_header: bool,
    /// Line terminator
    pub line_terminator: LineTerminator,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            write_header: true,
            line_terminator: LineTerminator::LF,
        }
    }
}

/// Line terminator type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// Unix-style (LF)
    LF,
    /// Windows-style (CRLF)
    CRLF,
}

impl LineTerminator {
    pub(crate) fn to_csv(self) -> csv::Terminator {
        match self {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        }
    }
}
