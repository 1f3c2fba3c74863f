//! The order report pipeline.
//!
//! A run is authorize, resolve window, fetch, filter, aggregate. Every stage
//! after fetching is pure and works on copies of the fetched orders.

pub mod aggregate;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod gst;
pub mod table;
pub mod window;

use std::collections::HashMap;

use canteen_core::OrderId;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::backend::OrderSource;
use crate::config::ReportsConfig;
use crate::error::{ExportError, FetchError, ReportError};
use crate::scope::{ReportScope, authorize};
use crate::session::Identity;

use aggregate::{Aggregation, GroupSummary, SortKey, aggregate, summarize_by_day, summarize_by_outlet};
use export::ExportOptions;
use fetch::{TaggedOrder, fetch_orders};
use filter::{CompanyFilter, companies, filter_orders};
use gst::Receipt;
use window::{DateFilter, DateWindow};

/// Settings that shape every report, independent of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Wall-clock offset for date windows and displayed dates.
    pub utc_offset: FixedOffset,
    pub gst_rate: Decimal,
}

impl From<&ReportsConfig> for EngineSettings {
    fn from(config: &ReportsConfig) -> Self {
        Self {
            utc_offset: config.utc_offset,
            gst_rate: config.gst_rate,
        }
    }
}

/// A validated report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub scope: ReportScope,
    pub date_filter: DateFilter,
    pub company: CompanyFilter,
    pub sort: SortKey,
}

impl ReportRequest {
    /// Request over `scope` with no filters, sorted by date.
    #[must_use]
    pub fn new(scope: ReportScope) -> Self {
        Self {
            scope,
            date_filter: DateFilter::All,
            company: CompanyFilter::All,
            sort: SortKey::Date,
        }
    }
}

/// Raw filter controls as entered by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportForm {
    pub scope: ReportScope,
    pub range: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub company: String,
    pub sort: String,
}

impl ReportForm {
    #[must_use]
    pub fn new(scope: ReportScope) -> Self {
        Self {
            scope,
            range: String::new(),
            start: None,
            end: None,
            company: String::new(),
            sort: String::new(),
        }
    }

    /// Validate the controls.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidRange`] for a bad date filter and
    /// [`ReportError::InvalidOption`] for an unknown sort key.
    pub fn into_request(self) -> Result<ReportRequest, ReportError> {
        let date_filter =
            DateFilter::parse(&self.range, self.start.as_deref(), self.end.as_deref())?;
        let sort = self.sort.parse()?;
        let company = self.company.parse().unwrap_or_default();
        Ok(ReportRequest {
            scope: self.scope,
            date_filter,
            company,
            sort,
        })
    }
}

/// A completed report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub request: ReportRequest,
    pub settings: EngineSettings,
    pub window: Option<DateWindow>,
    /// Filtered orders in fetch order.
    pub orders: Vec<TaggedOrder>,
    pub aggregation: Aggregation,
    /// Company keys available for the company filter within the window.
    pub companies: Vec<String>,
    /// Units that could not be fetched and were counted as empty.
    pub failed_units: Vec<FetchError>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// No orders survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aggregation.is_empty()
    }

    #[must_use]
    pub fn outlet_summary(&self) -> Vec<GroupSummary<String>> {
        summarize_by_outlet(&self.orders)
    }

    #[must_use]
    pub fn day_summary(&self) -> Vec<GroupSummary<NaiveDate>> {
        summarize_by_day(&self.orders, self.settings.utc_offset)
    }

    /// Client-side receipts for every order, in sorted order.
    #[must_use]
    pub fn receipts(&self) -> Vec<Receipt> {
        self.sorted_orders()
            .into_iter()
            .map(|tagged| Receipt::for_order(&tagged.order, self.settings.gst_rate))
            .collect()
    }

    /// Receipts whose GST differs from the backend's by more than `tolerance`.
    #[must_use]
    pub fn unreconciled_receipts(&self, tolerance: Decimal) -> Vec<Receipt> {
        self.sorted_orders()
            .into_iter()
            .filter_map(|tagged| {
                let receipt = Receipt::for_order(&tagged.order, self.settings.gst_rate);
                (!receipt.reconciles_with_backend(&tagged.order, tolerance)).then_some(receipt)
            })
            .collect()
    }

    /// Export file name for this report.
    #[must_use]
    pub fn file_name(&self) -> String {
        let generated_on = self.generated_at.with_timezone(&self.settings.utc_offset).date_naive();
        export::file_name(
            &self.request.scope.slug(),
            &self.request.date_filter.label(),
            generated_on,
        )
    }

    /// Workbook bytes, or `None` when there is nothing to export.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if workbook generation fails.
    pub fn to_xlsx(&self, options: ExportOptions) -> Result<Option<Vec<u8>>, ExportError> {
        export::export_xlsx(&self.aggregation, options)
    }

    fn sorted_orders(&self) -> Vec<&TaggedOrder> {
        let mut by_id: HashMap<&OrderId, &TaggedOrder> = HashMap::with_capacity(self.orders.len());
        for tagged in &self.orders {
            by_id.entry(&tagged.order.id).or_insert(tagged);
        }
        self.aggregation
            .orders
            .iter()
            .filter_map(|total| by_id.get(&total.order_id).copied())
            .collect()
    }
}

/// Run a report for `identity`.
///
/// Authorization and window resolution happen before any backend call.
///
/// # Errors
///
/// Returns [`ReportError`] if the identity may not view the scope, or the
/// orders cannot be fetched at all.
#[instrument(skip(source, identity, request, settings), fields(scope = %request.scope, user_id = %identity.user_id))]
pub async fn run_report<S: OrderSource>(
    source: &S,
    identity: &Identity,
    request: ReportRequest,
    settings: EngineSettings,
    now: DateTime<Utc>,
) -> Result<Report, ReportError> {
    authorize(identity, &request.scope)?;
    let window = request.date_filter.resolve(now, settings.utc_offset);

    let fetched = fetch_orders(source, &request.scope, window.as_ref()).await?;

    let in_window = filter_orders(&fetched.orders, window.as_ref(), &CompanyFilter::All);
    let company_keys = companies(&in_window);
    let orders = filter_orders(&in_window, None, &request.company);
    let aggregation = aggregate(&orders, request.sort, settings.utc_offset);

    tracing::info!(
        fetched = fetched.orders.len(),
        kept = orders.len(),
        failed_units = fetched.failed_units.len(),
        grand_total = %aggregation.grand_total,
        "Report built"
    );

    Ok(Report {
        request,
        settings,
        window,
        orders,
        aggregation,
        companies: company_keys,
        failed_units: fetched.failed_units,
        generated_at: now,
    })
}
