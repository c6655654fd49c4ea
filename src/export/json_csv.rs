// src/export/json_csv.rs

use crate::errors::{AppError, AppResult};
use crate::export::model::ReportDocument;
use crate::export::{ExportFormat, notify_export_success};
use crate::ui::messages::info;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    doc: &'a ReportDocument,
    total_row: crate::export::model::SessionRecord,
}

/// Pretty-printed JSON: header fields, subtotals, sessions and the total row.
pub(crate) fn export_json(doc: &ReportDocument, path: &Path) -> AppResult<()> {
    info(format!("Exporting to JSON: {}", path.display()));

    let total_row = doc
        .records_with_total()
        .pop()
        .ok_or_else(|| AppError::Export("missing total row".into()))?;
    let json_data = serde_json::to_string_pretty(&JsonReport { doc, total_row })
        .map_err(|e| AppError::Export(format!("JSON serialization error: {e}")))?;

    let mut file = File::create(path)?;
    file.write_all(json_data.as_bytes())?;

    notify_export_success(ExportFormat::Json, path);
    Ok(())
}

/// CSV of the session rows plus a final TOTAL row (header from serde).
pub(crate) fn export_csv(doc: &ReportDocument, path: &Path) -> AppResult<()> {
    info(format!("Exporting to CSV: {}", path.display()));

    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| AppError::Export(format!("CSV open error: {e}")))?;

    for item in doc.records_with_total() {
        wtr.serialize(&item)
            .map_err(|e| AppError::Export(format!("CSV write error: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::Export(format!("CSV flush error: {e}")))?;

    notify_export_success(ExportFormat::Csv, path);
    Ok(())
}
