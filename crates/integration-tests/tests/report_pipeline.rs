//! End-to-end report runs: mock backend, real client, view and export.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use canteen_core::{BuildingId, Role, StallId, UserId};
use canteen_integration_tests::xlsx::SheetCells;
use canteen_integration_tests::{MockBackend, session};
use canteen_reports::report::export::{ExportOptions, parse_grand_total, write_report};
use canteen_reports::{
    BackendClient, EngineSettings, RefreshOutcome, ReportForm, ReportScope, ReportView, Session,
    StallRef, ViewState,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap()
}

struct Harness {
    backend: MockBackend,
    client: BackendClient,
    session: Session,
    settings: EngineSettings,
}

impl Harness {
    async fn start(role: Role) -> Self {
        let backend = MockBackend::start().await.unwrap();
        let config = backend.config().unwrap();
        let session = session(role);
        let client = BackendClient::new(&config, &session).unwrap();
        Self {
            backend,
            client,
            session,
            settings: EngineSettings::from(&config),
        }
    }

    async fn run(&self, form: ReportForm) -> (RefreshOutcome, ViewState, ReportView) {
        let view = ReportView::new();
        let outcome = view
            .submit(&self.client, self.session.identity(), form, self.settings, now())
            .await;
        let state = view.state().await;
        (outcome, state, view)
    }
}

fn building_form() -> ReportForm {
    ReportForm {
        range: "today".to_owned(),
        ..ReportForm::new(ReportScope::Building(BuildingId::new(1)))
    }
}

#[tokio::test]
async fn test_building_report_isolates_failing_outlet() {
    let harness = Harness::start(Role::Admin).await;
    let (outcome, state, _view) = harness.run(building_form()).await;
    assert_eq!(outcome, RefreshOutcome::Committed);

    let report = state.report().unwrap();
    let tokens: Vec<&str> = report.aggregation.rows.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(tokens, vec!["T1", "T2"]);
    assert_eq!(report.aggregation.grand_total, Decimal::new(3530, 2));
    assert_eq!(report.aggregation.wallet_total, Decimal::new(2040, 2));

    let failed: Vec<&str> = report.failed_units.iter().map(|f| f.unit.as_str()).collect();
    assert_eq!(failed, vec!["Bravo"]);
    assert_eq!(report.companies, vec!["cashe.co", "other.com"]);

    // outlet listing plus one range request per outlet
    assert_eq!(harness.backend.state.request_count(), 4);
    assert_eq!(harness.backend.state.range_queries().len(), 3);
}

#[tokio::test]
async fn test_company_filter_over_http() {
    let harness = Harness::start(Role::Admin).await;
    let form = ReportForm {
        company: "cashe.co".to_owned(),
        ..building_form()
    };
    let (_, state, _view) = harness.run(form).await;

    let report = state.report().unwrap();
    assert_eq!(report.orders.len(), 1);
    assert_eq!(report.aggregation.grand_total, Decimal::new(2040, 2));
}

#[tokio::test]
async fn test_invalid_range_issues_no_requests() {
    let harness = Harness::start(Role::Admin).await;
    let form = ReportForm {
        range: "custom".to_owned(),
        start: Some("2025-01-10".to_owned()),
        end: Some("2025-01-01".to_owned()),
        ..building_form()
    };
    let (_, state, _view) = harness.run(form).await;

    assert!(matches!(state, ViewState::Failed(_)));
    assert_eq!(harness.backend.state.request_count(), 0);
}

#[tokio::test]
async fn test_outlet_without_orders_is_empty_state() {
    let harness = Harness::start(Role::Vendor).await;
    let form = ReportForm::new(ReportScope::Stall(StallRef::named(StallId::new(3), "Charlie")));
    let (_, state, view) = harness.run(form).await;

    assert!(matches!(state, ViewState::Empty { ref failed_units } if failed_units.is_empty()));
    assert!(view.export_xlsx(ExportOptions::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_only_outlet_failing_is_failed_state() {
    let harness = Harness::start(Role::Vendor).await;
    let form = ReportForm::new(ReportScope::Stall(StallRef::named(StallId::new(2), "Bravo")));
    let (_, state, _view) = harness.run(form).await;

    assert!(matches!(state, ViewState::Failed(ref message) if message.contains("All 1 order fetches failed")));
}

#[tokio::test]
async fn test_forbidden_role_issues_no_requests() {
    let harness = Harness::start(Role::Hr).await;
    let (_, state, _view) = harness.run(building_form()).await;

    assert!(matches!(state, ViewState::Failed(ref message) if message.contains("Forbidden")));
    assert_eq!(harness.backend.state.request_count(), 0);
}

#[tokio::test]
async fn test_purchaser_report_uses_order_outlet_names() {
    let harness = Harness::start(Role::Hr).await;
    let form = ReportForm::new(ReportScope::Users(vec![UserId::new(42), UserId::new(43)]));
    let (_, state, _view) = harness.run(form).await;

    let report = state.report().unwrap();
    assert_eq!(report.orders.len(), 1);
    assert_eq!(report.orders.first().unwrap().label, "Alpha");
    assert!(report.failed_units.is_empty());
}

#[tokio::test]
async fn test_export_writes_valid_workbook() {
    let harness = Harness::start(Role::Admin).await;
    let (_, state, view) = harness.run(building_form()).await;
    let report = state.report().unwrap();

    let bytes = view
        .export_xlsx(ExportOptions { include_gst: true })
        .await
        .unwrap()
        .unwrap();

    let dir = std::env::temp_dir().join(format!("canteen-it-{}", uuid::Uuid::new_v4()));
    let path = dir.join(report.file_name());
    write_report(&path, &bytes).unwrap();
    assert!(path.ends_with("sales-report-building-1-today-20250110.xlsx"));

    let cells = SheetCells::read(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(cells.sheet_names, vec!["Sales Report"]);
    assert_eq!(cells.text("H1"), Some("GST"));
    assert_eq!(cells.text("I1"), Some("Round Off"));
    assert_eq!(cells.text("J1"), Some("Total Paid"));

    let rows = &report.aggregation.rows;
    for (line, row) in (2u32..).zip(rows) {
        assert_eq!(cells.text(&format!("B{line}")), Some(row.token.as_str()));
        assert_eq!(cells.text(&format!("D{line}")), Some(row.date_display.as_str()));
        assert_eq!(cells.text(&format!("E{line}")), Some(row.item_name.as_str()));
        assert_eq!(cells.number(&format!("F{line}")), Some(f64::from(row.quantity)));
        assert_eq!(cells.number(&format!("G{line}")), row.price.to_f64());
        assert_eq!(
            cells.number(&format!("J{line}")),
            row.total_paid.and_then(|t| t.to_f64())
        );
    }

    let total_line = cells.last_row();
    assert_eq!(usize::try_from(total_line).unwrap(), rows.len() + 2);
    let total = cells.text(&format!("J{total_line}")).unwrap();
    assert_eq!(parse_grand_total(total), Some(report.aggregation.grand_total));
    assert_eq!(cells.text(&format!("A{total_line}")), None);

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_export_without_gst_keeps_total_in_column_h() {
    let harness = Harness::start(Role::Admin).await;
    let form = ReportForm {
        sort: "outlet".to_owned(),
        ..building_form()
    };
    let (_, state, view) = harness.run(form).await;
    let report = state.report().unwrap();

    let bytes = view
        .export_xlsx(ExportOptions::default())
        .await
        .unwrap()
        .unwrap();
    let cells = SheetCells::read(&bytes).unwrap();

    assert_eq!(cells.text("G1"), Some("Price"));
    assert_eq!(cells.text("H1"), Some("Total Paid"));
    assert_eq!(cells.text("I1"), None);

    let rows = &report.aggregation.rows;
    for (line, row) in (2u32..).zip(rows) {
        assert_eq!(cells.text(&format!("A{line}")), Some(row.outlet.as_str()));
        assert_eq!(cells.text(&format!("E{line}")), Some(row.item_name.as_str()));
        assert_eq!(cells.number(&format!("F{line}")), Some(f64::from(row.quantity)));
        assert_eq!(cells.number(&format!("G{line}")), row.price.to_f64());
    }
    let total = cells.text(&format!("H{}", rows.len() + 2)).unwrap();
    assert_eq!(parse_grand_total(total), Some(Decimal::new(3530, 2)));
}

#[tokio::test]
async fn test_html_table_matches_report() {
    let harness = Harness::start(Role::Admin).await;
    let (_, _, view) = harness.run(building_form()).await;

    let html = view.render_html().await.unwrap().unwrap();
    assert!(html.contains("Sales report: building 1"));
    assert!(html.contains("Could not load orders for: Bravo"));
    assert!(html.contains("Grand total: ₹35.30"));
}
