//! Spreadsheet export.
//!
//! The column contract lives in [`build_sheet`], which produces a plain grid;
//! [`Sheet::to_xlsx`] only serialises that grid. The HTML table has its own
//! column set and does not go through here.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};

use canteen_core::Money;

use crate::error::ExportError;
use crate::report::aggregate::{Aggregation, ReportRow};

/// Name of the single worksheet in every export.
pub const SHEET_NAME: &str = "Sales Report";

/// Prefix of the text in the trailing grand-total cell.
pub const GRAND_TOTAL_PREFIX: &str = "Grand Total: ";

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Blank,
    Text(String),
    Integer(i64),
    Amount(Decimal),
}

/// Which optional columns to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Adds item GST and order round-off columns before Total Paid.
    pub include_gst: bool,
}

/// A header row plus data rows, the last of which is the grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Lay out report rows as a grid with a trailing grand-total row.
#[must_use]
pub fn build_sheet(aggregation: &Aggregation, options: ExportOptions) -> Sheet {
    let mut header: Vec<String> = ["Outlet", "Token", "Email", "Date", "Item", "Quantity", "Price"]
        .into_iter()
        .map(str::to_owned)
        .collect();
    if options.include_gst {
        header.push("GST".to_owned());
        header.push("Round Off".to_owned());
    }
    header.push("Total Paid".to_owned());

    let mut rows: Vec<Vec<Cell>> = aggregation
        .rows
        .iter()
        .map(|row| data_row(row, options))
        .collect();

    let mut total_row = vec![Cell::Blank; header.len() - 1];
    total_row.push(Cell::Text(format!(
        "{GRAND_TOTAL_PREFIX}{}",
        Money::inr(aggregation.grand_total).display()
    )));
    rows.push(total_row);

    Sheet {
        name: SHEET_NAME.to_owned(),
        header,
        rows,
    }
}

fn data_row(row: &ReportRow, options: ExportOptions) -> Vec<Cell> {
    let optional_amount = |value: Option<Decimal>| value.map_or(Cell::Blank, Cell::Amount);

    let mut cells = vec![
        Cell::Text(row.outlet.clone()),
        Cell::Text(row.token.clone()),
        Cell::Text(row.email.clone()),
        Cell::Text(row.date_display.clone()),
        Cell::Text(row.item_name.clone()),
        Cell::Integer(i64::from(row.quantity)),
        Cell::Amount(row.price),
    ];
    if options.include_gst {
        cells.push(optional_amount(row.gst));
        cells.push(optional_amount(row.round_off));
    }
    cells.push(optional_amount(row.total_paid));
    cells
}

impl Sheet {
    /// Serialise to xlsx bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if an amount is not representable as a number
    /// or the workbook cannot be written.
    pub fn to_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.name)?;

        let bold = Format::new().set_bold();
        let money = Format::new().set_num_format("0.00");

        for (col, title) in (0u16..).zip(&self.header) {
            worksheet.write_string_with_format(0, col, title, &bold)?;
        }

        for (row_index, cells) in (1u32..).zip(&self.rows) {
            for (col, cell) in (0u16..).zip(cells) {
                match cell {
                    Cell::Blank => {}
                    Cell::Text(text) => {
                        worksheet.write_string(row_index, col, text)?;
                    }
                    Cell::Integer(value) => {
                        let value = value
                            .to_f64()
                            .ok_or_else(|| ExportError::Amount(value.to_string()))?;
                        worksheet.write_number(row_index, col, value)?;
                    }
                    Cell::Amount(amount) => {
                        let value = amount
                            .to_f64()
                            .ok_or_else(|| ExportError::Amount(amount.to_string()))?;
                        worksheet.write_number_with_format(row_index, col, value, &money)?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Build the workbook for a report. Nothing to export yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`ExportError`] if workbook generation fails.
pub fn export_xlsx(
    aggregation: &Aggregation,
    options: ExportOptions,
) -> Result<Option<Vec<u8>>, ExportError> {
    if aggregation.rows.is_empty() {
        tracing::debug!("No rows to export");
        return Ok(None);
    }
    build_sheet(aggregation, options).to_xlsx().map(Some)
}

/// Deterministic file name, e.g. `sales-report-building-3-week-20250115.xlsx`.
#[must_use]
pub fn file_name(scope_slug: &str, window_label: &str, generated_on: NaiveDate) -> String {
    format!(
        "sales-report-{scope_slug}-{window_label}-{}.xlsx",
        generated_on.format("%Y%m%d")
    )
}

/// Write export bytes to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be written.
pub fn write_report(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Report exported");
    Ok(())
}

/// The amount in a grand-total cell, e.g. `35.30` from `Grand Total: ₹35.30`.
#[must_use]
pub fn parse_grand_total(text: &str) -> Option<Decimal> {
    text.strip_prefix(GRAND_TOTAL_PREFIX)?
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '-')
        .parse()
        .ok()
}
