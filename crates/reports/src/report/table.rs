//! HTML rendering of a report.
//!
//! Mirrors the spreadsheet content but owns its column set, so the two
//! formats can change independently.

use askama::Template;

use canteen_core::{Money, format_amount};

use crate::error::ExportError;
use crate::report::Report;
use crate::report::aggregate::ReportRow;

/// Column definition for the report table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Stable identifier, rendered as the header's `data-column`.
    pub key: &'static str,
    pub label: &'static str,
    /// Right-aligned numeric column.
    pub numeric: bool,
}

impl TableColumn {
    const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            numeric: false,
        }
    }

    const fn numeric(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            numeric: true,
        }
    }
}

const COLUMNS: [TableColumn; 10] = [
    TableColumn::text("outlet", "Outlet"),
    TableColumn::text("token", "Token"),
    TableColumn::text("email", "Email"),
    TableColumn::text("date", "Date"),
    TableColumn::text("item", "Item"),
    TableColumn::numeric("quantity", "Qty"),
    TableColumn::numeric("price", "Price"),
    TableColumn::numeric("gst", "GST"),
    TableColumn::numeric("round_off", "Round Off"),
    TableColumn::numeric("total_paid", "Total Paid"),
];

/// A rendered table cell.
#[derive(Debug, Clone)]
pub struct CellView {
    pub text: String,
    pub numeric: bool,
}

/// One table row.
#[derive(Debug, Clone)]
pub struct RowView {
    pub cells: Vec<CellView>,
    pub first_of_order: bool,
}

impl RowView {
    fn from_row(row: &ReportRow) -> Self {
        let amount = |value: Option<rust_decimal::Decimal>| value.map(format_amount).unwrap_or_default();
        let texts = [
            row.outlet.clone(),
            row.token.clone(),
            row.email.clone(),
            row.date_display.clone(),
            row.item_name.clone(),
            row.quantity.to_string(),
            format_amount(row.price),
            amount(row.gst),
            amount(row.round_off),
            amount(row.total_paid),
        ];
        Self {
            cells: COLUMNS
                .iter()
                .zip(texts)
                .map(|(column, text)| CellView {
                    text,
                    numeric: column.numeric,
                })
                .collect(),
            first_of_order: row.is_first_row_of_order,
        }
    }
}

/// Report table template.
#[derive(Template)]
#[template(path = "report_table.html")]
pub struct ReportTableTemplate {
    pub title: String,
    pub window: String,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<RowView>,
    pub order_count: usize,
    pub grand_total: String,
    pub wallet_total: String,
    pub other_total: String,
    pub failed_units: Vec<String>,
}

impl ReportTableTemplate {
    #[must_use]
    pub fn for_report(report: &Report) -> Self {
        let aggregation = &report.aggregation;
        Self {
            title: format!("Sales report: {}", report.request.scope),
            window: report
                .window
                .map_or_else(|| "All orders".to_owned(), |w| w.to_string()),
            columns: COLUMNS.to_vec(),
            rows: aggregation.rows.iter().map(RowView::from_row).collect(),
            order_count: aggregation.order_count(),
            grand_total: Money::inr(aggregation.grand_total).display(),
            wallet_total: Money::inr(aggregation.wallet_total).display(),
            other_total: Money::inr(aggregation.other_total).display(),
            failed_units: report.failed_units.iter().map(|f| f.unit.clone()).collect(),
        }
    }
}

/// Render a report as a standalone HTML page.
///
/// # Errors
///
/// Returns [`ExportError::Template`] if rendering fails.
pub fn render_html(report: &Report) -> Result<String, ExportError> {
    Ok(ReportTableTemplate::for_report(report).render()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_table_mirrors_rows_and_total() {
        let html = render_html(&sample_report()).unwrap();
        assert!(html.contains(r#"<th data-column="total_paid" class="num">Total Paid</th>"#));
        assert!(html.contains(r#"<th data-column="outlet">Outlet</th>"#));
        assert!(html.contains("Coffee"));
        assert!(html.contains("20.40"));
        assert!(html.contains("Grand total: ₹35.30"));
        assert_eq!(html.matches("class=\"order-start\"").count(), 2);
        assert!(!html.contains("No orders found"));
    }

    #[test]
    fn test_empty_report_shows_message() {
        let mut report = sample_report();
        report.aggregation = crate::report::aggregate::Aggregation::default();
        let html = render_html(&report).unwrap();
        assert!(html.contains("No orders found"));
        assert!(!html.contains("<tbody>"));
    }

    #[test]
    fn test_failed_units_are_listed() {
        let mut report = sample_report();
        report.failed_units.push(crate::error::FetchError {
            unit: "Dosa Corner".to_owned(),
            message: "timeout".to_owned(),
        });
        let html = render_html(&report).unwrap();
        assert!(html.contains("Dosa Corner"));
    }
}
