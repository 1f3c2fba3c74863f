//! Report view state machine.
//!
//! `Idle -> Loading -> {Empty | Ready | Failed}`, re-entering `Loading` on
//! every submission. Each submission takes a generation number; a result is
//! committed only if no newer submission has started, so a slow earlier
//! request can never overwrite a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::backend::OrderSource;
use crate::error::{ExportError, FetchError};
use crate::report::export::ExportOptions;
use crate::report::table::render_html;
use crate::report::{EngineSettings, Report, ReportForm, run_report};
use crate::session::Identity;

/// What the view currently shows.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    /// The fetch completed but no orders matched.
    Empty { failed_units: Vec<FetchError> },
    Ready(Arc<Report>),
    /// The submission was rejected or the fetch failed as a whole.
    Failed(String),
}

impl ViewState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn report(&self) -> Option<&Arc<Report>> {
        match self {
            Self::Ready(report) => Some(report),
            _ => None,
        }
    }
}

/// Whether a submission's result was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Committed,
    /// A newer submission started first; this result was discarded.
    Superseded,
}

/// Holds the current report for one view instance.
#[derive(Debug, Default)]
pub struct ReportView {
    generation: AtomicU64,
    state: RwLock<ViewState>,
}

impl ReportView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Validate `form`, fetch, and commit the outcome unless superseded.
    ///
    /// Invalid forms fail before any backend call.
    pub async fn submit<S: OrderSource>(
        &self,
        source: &S,
        identity: &Identity,
        form: ReportForm,
        settings: EngineSettings,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.write().await = ViewState::Loading;

        let next = match form.into_request() {
            Ok(request) => match run_report(source, identity, request, settings, now).await {
                Ok(report) if report.is_empty() => ViewState::Empty {
                    failed_units: report.failed_units,
                },
                Ok(report) => ViewState::Ready(Arc::new(report)),
                Err(e) => {
                    tracing::error!(error = %e, "Report failed");
                    ViewState::Failed(e.to_string())
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Report form rejected");
                ViewState::Failed(e.to_string())
            }
        };

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Discarding superseded report result");
            return RefreshOutcome::Superseded;
        }
        *state = next;
        RefreshOutcome::Committed
    }

    /// Export the current report. `None` when nothing is ready to export.
    ///
    /// A failure here leaves the view state untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if workbook generation fails.
    pub async fn export_xlsx(&self, options: ExportOptions) -> Result<Option<Vec<u8>>, ExportError> {
        let report = self.state.read().await.report().cloned();
        match report {
            Some(report) => report.to_xlsx(options),
            None => Ok(None),
        }
    }

    /// Render the current report as HTML.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Template`] if rendering fails.
    pub async fn render_html(&self) -> Result<Option<String>, ExportError> {
        let report = self.state.read().await.report().cloned();
        report.map(|report| render_html(&report)).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::sync::Notify;

    use canteen_core::{AdminId, BuildingId, StallId, UserId};

    use super::*;
    use crate::backend::{BackendError, Order, Stall};
    use crate::report::fetch::tests::{MemorySource, order};
    use crate::report::tests::{admin, now, two_order_source, utc_settings};
    use crate::report::window::DateWindow;
    use crate::scope::{ReportScope, StallRef};

    /// Holds fetches for `gated` until the gate is opened.
    struct GatedSource {
        inner: MemorySource,
        gated: StallId,
        gate: Notify,
    }

    impl OrderSource for GatedSource {
        async fn stall_orders(
            &self,
            stall_id: StallId,
            window: Option<&DateWindow>,
        ) -> Result<Vec<Order>, BackendError> {
            if stall_id == self.gated {
                self.gate.notified().await;
            }
            self.inner.stall_orders(stall_id, window).await
        }

        async fn user_orders(&self, user_id: UserId) -> Result<Vec<Order>, BackendError> {
            self.inner.user_orders(user_id).await
        }

        async fn building_stalls(&self, building_id: BuildingId) -> Result<Vec<Stall>, BackendError> {
            self.inner.building_stalls(building_id).await
        }

        async fn admin_stalls(&self, admin_id: AdminId) -> Result<Vec<Stall>, BackendError> {
            self.inner.admin_stalls(admin_id).await
        }
    }

    fn stall_form(id: i64) -> ReportForm {
        ReportForm::new(ReportScope::Stall(StallRef::new(StallId::new(id))))
    }

    #[tokio::test]
    async fn test_newer_submission_supersedes_slow_one() {
        let mut inner = two_order_source();
        inner
            .stall_orders
            .insert(StallId::new(2), vec![order("Z", "T7", 12, "z@x.com", &[("Juice", 1, 40)])]);
        let source = GatedSource {
            inner,
            gated: StallId::new(1),
            gate: Notify::new(),
        };
        let view = ReportView::new();
        let identity = admin();

        let (slow, fast) = tokio::join!(
            view.submit(&source, &identity, stall_form(1), utc_settings(), now()),
            async {
                let outcome = view
                    .submit(&source, &identity, stall_form(2), utc_settings(), now())
                    .await;
                source.gate.notify_one();
                outcome
            }
        );

        assert_eq!(slow, RefreshOutcome::Superseded);
        assert_eq!(fast, RefreshOutcome::Committed);
        let state = view.state().await;
        let report = state.report().unwrap();
        assert_eq!(report.orders.len(), 1);
        assert_eq!(report.orders.first().unwrap().order.id.as_str(), "Z");
    }

    #[tokio::test]
    async fn test_invalid_range_fails_without_fetching() {
        let source = two_order_source();
        let view = ReportView::new();
        let form = ReportForm {
            range: "custom".to_owned(),
            start: Some("2025-01-10".to_owned()),
            end: Some("2025-01-09".to_owned()),
            ..stall_form(1)
        };

        let outcome = view.submit(&source, &admin(), form, utc_settings(), now()).await;
        assert_eq!(outcome, RefreshOutcome::Committed);
        assert!(matches!(view.state().await, ViewState::Failed(message) if message.contains("before start")));
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_matching_orders_is_empty_state() {
        let source = two_order_source();
        let view = ReportView::new();
        let form = ReportForm {
            company: "nobody".to_owned(),
            ..stall_form(1)
        };

        view.submit(&source, &admin(), form, utc_settings(), now()).await;
        assert!(matches!(view.state().await, ViewState::Empty { failed_units } if failed_units.is_empty()));
        assert!(view.export_xlsx(ExportOptions::default()).await.unwrap().is_none());
        assert!(view.render_html().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_units_failing_is_failed_state() {
        let source = MemorySource {
            failing: vec![StallId::new(9)],
            ..MemorySource::default()
        };
        let view = ReportView::new();
        view.submit(&source, &admin(), stall_form(9), utc_settings(), now()).await;
        assert!(matches!(view.state().await, ViewState::Failed(message) if message.contains("All 1")));
    }

    #[tokio::test]
    async fn test_ready_report_exports() {
        let source = two_order_source();
        let view = ReportView::new();
        assert!(matches!(view.state().await, ViewState::Idle));

        view.submit(&source, &admin(), stall_form(1), utc_settings(), now()).await;
        let state = view.state().await;
        assert!(!state.is_loading());
        assert_eq!(state.report().unwrap().aggregation.order_count(), 2);

        let bytes = view.export_xlsx(ExportOptions::default()).await.unwrap().unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(view.render_html().await.unwrap().unwrap().contains("Tea"));
    }
}
