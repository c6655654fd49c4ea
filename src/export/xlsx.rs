// src/export/xlsx.rs

use crate::errors::{AppError, AppResult};
use crate::export::excel_date::parse_to_excel_date;
use crate::export::model::{ReportDocument, session_headers, subtotal_headers};
use crate::export::{ExportFormat, notify_export_success};
use crate::ui::messages::info;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

/// Workbook with a "Sessions" detail sheet and an "Employees" subtotal sheet.
pub(crate) fn export_xlsx(doc: &ReportDocument, path: &Path) -> AppResult<()> {
    info(format!("Exporting to XLSX: {}", path.display()));

    let mut workbook = Workbook::new();

    let detail: Vec<Vec<String>> = doc
        .sessions
        .iter()
        .map(|s| {
            vec![
                s.employee.clone(),
                s.role.clone(),
                s.date.clone(),
                s.clock_in.clone(),
                s.clock_out.clone(),
                format!("{:.2}", s.hours),
            ]
        })
        .collect();
    let total = vec![
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        format!("{:.2}", doc.total_hours),
    ];
    let sheet = workbook.add_worksheet().set_name("Sessions").map_err(to_app_error)?;
    write_sheet(sheet, &session_headers(), &detail, Some(&total))?;

    let subtotals: Vec<Vec<String>> = doc
        .subtotals
        .iter()
        .map(|s| {
            vec![
                s.employee.clone(),
                s.role.clone(),
                s.sessions.to_string(),
                format!("{:.2}", s.hours),
            ]
        })
        .collect();
    let average = vec![
        "AVERAGE".to_string(),
        String::new(),
        String::new(),
        format!("{:.2}", doc.average_hours),
    ];
    let sheet = workbook.add_worksheet().set_name("Employees").map_err(to_app_error)?;
    write_sheet(sheet, &subtotal_headers(), &subtotals, Some(&average))?;

    workbook.save(path).map_err(to_app_error)?;

    notify_export_success(ExportFormat::Xlsx, path);
    Ok(())
}

/// Styled header, banded rows, optional bold footer and auto column widths.
fn write_sheet(
    worksheet: &mut Worksheet,
    headers: &[&str],
    rows: &[Vec<String>],
    footer: Option<&Vec<String>>,
) -> AppResult<()> {
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_background_color(Color::RGB(0x2F75B5))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_with_format(0, col as u16, *header, &header_format)
            .map_err(to_app_error)?;
    }
    worksheet.set_freeze_panes(1, 0).map_err(to_app_error)?;

    let mut col_widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();

    let band1 = Color::RGB(0xEAF3FB);
    let band2 = Color::RGB(0xFFFFFF);

    if rows.is_empty() {
        worksheet.write(1, 0, "No data available").map_err(to_app_error)?;
    }

    for (row_index, values) in rows.iter().enumerate() {
        let row = (row_index + 1) as u32;
        let band = if row_index % 2 == 0 { band1 } else { band2 };
        for (col, value) in values.iter().enumerate() {
            write_xlsx_cell(worksheet, row, col as u16, value, band, false)?;
            if let Some(w) = col_widths.get_mut(col) {
                *w = (*w).max(UnicodeWidthStr::width(value.as_str()));
            }
        }
    }

    if let Some(values) = footer {
        let row = (rows.len().max(1) + 1) as u32;
        for (col, value) in values.iter().enumerate() {
            write_xlsx_cell(worksheet, row, col as u16, value, Color::RGB(0xD9E1F2), true)?;
        }
    }

    for (c, w) in col_widths.iter().enumerate() {
        worksheet
            .set_column_width(c as u16, *w as f64 + 2.0)
            .map_err(to_app_error)?;
    }
    Ok(())
}

/// Write one cell, turning dates, times and numbers into native Excel values.
fn write_xlsx_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    s: &str,
    bg: Color,
    bold: bool,
) -> AppResult<()> {
    let mut fmt = Format::new()
        .set_background_color(bg)
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);
    if bold {
        fmt = fmt.set_bold();
    }

    if let Some((num_format, serial)) = parse_to_excel_date(s) {
        let fmt = fmt.set_num_format(num_format);
        worksheet
            .write_with_format(row, col, serial, &fmt)
            .map_err(to_app_error)?;
        return Ok(());
    }

    if let Ok(num) = s.parse::<f64>() {
        let fmt = fmt.set_align(FormatAlign::Right).set_num_format(if s.contains('.') {
            "0.00"
        } else {
            "0"
        });
        worksheet
            .write_with_format(row, col, num, &fmt)
            .map_err(to_app_error)?;
        return Ok(());
    }

    worksheet
        .write_with_format(row, col, s, &fmt)
        .map_err(to_app_error)?;
    Ok(())
}

fn to_app_error<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Export(e.to_string())
}
