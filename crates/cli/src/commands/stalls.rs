//! Outlet listing.

use canteen_reports::backend::Stall;
use canteen_reports::{BackendClient, OrderSource, ReportScope, ReportsConfig, SessionStore, authorize};

use super::CommandError;

/// List the outlets of a building or vendor admin account.
///
/// # Errors
///
/// Returns `CommandError` if not logged in, the role may not view the
/// scope, or the backend call fails.
pub async fn list(config: &ReportsConfig, scope: ReportScope) -> Result<(), CommandError> {
    let session = SessionStore::new(&config.session_file).require()?;
    authorize(session.identity(), &scope)?;
    let client = BackendClient::new(config, &session)?;

    let stalls = match &scope {
        ReportScope::Building(id) => client.building_stalls(*id).await?,
        ReportScope::AdminStalls(id) => client.admin_stalls(*id).await?,
        other => {
            return Err(CommandError::InvalidArgument(format!(
                "cannot list outlets of {other}"
            )));
        }
    };

    if stalls.is_empty() {
        tracing::info!("No outlets found for {scope}");
        return Ok(());
    }

    tracing::info!("{} outlets in {scope}:", stalls.len());
    for stall in &stalls {
        tracing::info!("{}", describe(stall));
    }
    Ok(())
}

fn describe(stall: &Stall) -> String {
    let status = if stall.is_available { "open" } else { "closed" };
    let hours = match (&stall.opening_time, &stall.closing_time) {
        (Some(open), Some(close)) => format!(" {open}-{close}"),
        _ => String::new(),
    };
    format!("  [{}] {} ({status}){hours}", stall.id, stall.name)
}
