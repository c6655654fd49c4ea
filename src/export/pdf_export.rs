// src/export/pdf_export.rs

use crate::errors::{AppError, AppResult};
use crate::export::model::{
    ReportDocument, empty_session_row, empty_subtotal_row, session_headers, subtotal_headers,
};
use crate::export::{ExportFormat, notify_export_success};
use crate::export::pdf::PdfManager;
use crate::ui::messages::info;
use std::path::Path;

/// Summary lines, the per-employee subtotal table, then the session detail.
pub(crate) fn export_pdf(doc: &ReportDocument, path: &Path) -> AppResult<()> {
    info(format!("Exporting to PDF: {}", path.display()));

    let mut pdf = PdfManager::new(&doc.title);
    for line in doc.summary_lines() {
        pdf.text(&line);
    }
    pdf.gap(10.0);

    let mut subtotals = doc.subtotal_rows();
    if subtotals.is_empty() {
        subtotals.push(empty_subtotal_row(doc));
    }
    pdf.table(&subtotal_headers(), &subtotals);
    pdf.gap(16.0);

    let mut detail = doc.session_rows();
    if detail.is_empty() {
        detail.push(empty_session_row(doc));
    }
    pdf.table(&session_headers(), &detail);

    pdf.save(path)
        .map_err(|e| AppError::Export(format!("PDF export error: {e}")))?;

    notify_export_success(ExportFormat::Pdf, path);
    Ok(())
}
