//! Hour report writers. `logic` builds the `ReportDocument`, the private
//! modules render it.

mod excel_date;
mod fs_utils;
mod json_csv;
pub mod logic;
pub mod model;
mod pdf;
mod pdf_export;
pub(crate) mod range;
mod xlsx;

pub use logic::{ExportLogic, ExportRequest, ReportOptions};
pub use model::ReportDocument;

use crate::ui::messages::{success, warning};
use clap::ValueEnum;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Pdf => "PDF",
        }
    }

    /// Whether `path` ends in this format's extension (case-insensitive).
    pub fn matches_path(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }
}

pub(crate) fn notify_export_success(format: ExportFormat, path: &Path) {
    success(format!("{} report written to {}", format.label(), path.display()));
}

/// Export still proceeds; a `.csv` holding a PDF is only confusing.
pub(crate) fn warn_on_extension(format: ExportFormat, path: &Path) {
    if !format.matches_path(path) {
        warning(format!(
            "{} does not end in .{}; writing {} anyway.",
            path.display(),
            format.extension(),
            format.label()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_ignores_case() {
        assert!(ExportFormat::Pdf.matches_path(Path::new("/tmp/March.PDF")));
        assert!(!ExportFormat::Csv.matches_path(Path::new("/tmp/march.xlsx")));
        assert!(!ExportFormat::Json.matches_path(Path::new("/tmp/report")));
    }
}
