//! Report command.
//!
//! Drives a [`ReportView`] once and prints its final state.
//!
//! # Environment Variables
//!
//! - `CANTEEN_EXPORT_DIR` - Where `--export` writes workbooks

use std::path::{Path, PathBuf};

use chrono::Utc;

use canteen_core::Money;
use canteen_reports::report::export::{ExportOptions, write_report};
use canteen_reports::report::gst::{RECONCILE_TOLERANCE, Receipt};
use canteen_reports::report::table::render_html;
use canteen_reports::{
    BackendClient, EngineSettings, FetchError, Report, ReportForm, ReportScope, ReportView,
    ReportsConfig, SessionStore, ViewState,
};

use super::CommandError;

/// Filter controls as typed on the command line.
pub struct ReportFilters {
    pub range: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub company: String,
    pub sort: String,
}

/// Where to write the report.
pub struct ReportOutput {
    pub xlsx: Option<PathBuf>,
    /// Write to the export directory under the generated file name.
    pub export: bool,
    pub include_gst: bool,
    pub html: Option<PathBuf>,
    pub receipts: bool,
}

/// Build and print a report, writing any requested files.
///
/// # Errors
///
/// Returns `CommandError` if not logged in, the report fails, or a requested
/// file cannot be written.
pub async fn run(
    config: &ReportsConfig,
    scope: ReportScope,
    filters: ReportFilters,
    output: ReportOutput,
) -> Result<(), CommandError> {
    let session = SessionStore::new(&config.session_file).require()?;
    let client = BackendClient::new(config, &session)?;

    let form = ReportForm {
        range: filters.range,
        start: filters.start,
        end: filters.end,
        company: filters.company,
        sort: filters.sort,
        ..ReportForm::new(scope)
    };

    let view = ReportView::new();
    view.submit(
        &client,
        session.identity(),
        form,
        EngineSettings::from(config),
        Utc::now(),
    )
    .await;

    match view.state().await {
        ViewState::Ready(report) => {
            print_report(&report);
            if output.receipts {
                print_receipts(&report);
            }
            write_outputs(config, &report, &output)
        }
        ViewState::Empty { failed_units } => {
            warn_failed_units(&failed_units);
            tracing::info!("No orders found for the selected filters");
            Ok(())
        }
        ViewState::Failed(message) => Err(CommandError::ReportFailed(message)),
        ViewState::Idle | ViewState::Loading => Err(CommandError::ReportFailed(
            "report did not complete".to_owned(),
        )),
    }
}

fn print_report(report: &Report) {
    let aggregation = &report.aggregation;

    tracing::info!("Sales report for {}", report.request.scope);
    if let Some(window) = &report.window {
        tracing::info!("Window: {window}");
    }
    warn_failed_units(&report.failed_units);

    for order in &aggregation.orders {
        tracing::info!(
            "  {} | {} | {} | {}",
            order.created_at.with_timezone(&report.settings.utc_offset).format("%d/%m/%Y %H:%M"),
            order.outlet,
            order.token,
            Money::inr(order.total_paid).display()
        );
    }

    for group in report.outlet_summary() {
        tracing::info!(
            "{}: {} orders, {} items, {}",
            group.key,
            group.order_count,
            group.item_count,
            Money::inr(group.total_paid).display()
        );
    }

    for day in report.day_summary() {
        tracing::info!(
            "{}: {} orders, {}",
            day.key.format("%d/%m/%Y"),
            day.order_count,
            Money::inr(day.total_paid).display()
        );
    }

    tracing::info!(
        "Orders: {}  Wallet: {}  Other: {}",
        aggregation.order_count(),
        Money::inr(aggregation.wallet_total).display(),
        Money::inr(aggregation.other_total).display()
    );
    tracing::info!("Grand total: {}", Money::inr(aggregation.grand_total).display());
    tracing::info!("Companies: {}", report.companies.join(", "));
}

fn print_receipts(report: &Report) {
    for receipt in report.receipts() {
        tracing::info!("{}", describe_receipt(&receipt));
    }
    for receipt in report.unreconciled_receipts(RECONCILE_TOLERANCE) {
        tracing::warn!(
            token = %receipt.token,
            "Order {} GST {} does not match the backend",
            receipt.token,
            Money::inr(receipt.total_gst).display()
        );
    }
}

fn describe_receipt(receipt: &Receipt) -> String {
    let lines: Vec<String> = receipt
        .lines
        .iter()
        .map(|line| format!("{} x{}", line.name, line.quantity))
        .collect();
    format!(
        "Receipt {}: {} | subtotal {} + GST {} (CGST {}, SGST {}) round off {} = {}",
        receipt.token,
        lines.join(", "),
        Money::inr(receipt.subtotal).display(),
        Money::inr(receipt.total_gst).display(),
        Money::inr(receipt.cgst).display(),
        Money::inr(receipt.sgst).display(),
        Money::inr(receipt.round_off).display(),
        Money::inr(receipt.total_payable).display()
    )
}

fn warn_failed_units(failed: &[FetchError]) {
    for failure in failed {
        tracing::warn!("Skipped {}: {}", failure.unit, failure.message);
    }
}

fn write_outputs(
    config: &ReportsConfig,
    report: &Report,
    output: &ReportOutput,
) -> Result<(), CommandError> {
    let xlsx_path = output
        .xlsx
        .clone()
        .or_else(|| output.export.then(|| config.export_dir.join(report.file_name())));

    if let Some(path) = xlsx_path {
        let options = ExportOptions {
            include_gst: output.include_gst,
        };
        if let Some(bytes) = report.to_xlsx(options)? {
            write_report(&path, &bytes)?;
        }
    }

    if let Some(path) = &output.html {
        write_html(path, report)?;
    }
    Ok(())
}

fn write_html(path: &Path, report: &Report) -> Result<(), CommandError> {
    let html = render_html(report)?;
    write_report(path, html.as_bytes())?;
    Ok(())
}
