//! Session management commands.
//!
//! # Usage
//!
//! ```bash
//! canteen login --token "$TOKEN" --role vendor --user-id 7 --name "Asha" --admin-id 2
//! canteen whoami
//! canteen logout
//! ```

use canteen_core::{AdminId, BuildingId, Email, Role, UserId};
use canteen_reports::{Identity, ReportsConfig, Session, SessionStore};

use super::CommandError;

/// Login details as given on the command line.
pub struct LoginArgs {
    pub token: String,
    pub role: String,
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub building_id: Option<i64>,
    pub admin_id: Option<i64>,
}

/// Build the session described by `args`.
///
/// # Errors
///
/// Returns `CommandError::InvalidArgument` for an unknown role, a malformed
/// email, or an empty token.
pub fn build_session(args: LoginArgs) -> Result<Session, CommandError> {
    let role: Role = args
        .role
        .parse()
        .map_err(|e| CommandError::InvalidArgument(format!("{e}")))?;

    if args.token.trim().is_empty() {
        return Err(CommandError::InvalidArgument("token must not be empty".to_owned()));
    }

    let mut identity = Identity::new(UserId::new(args.user_id), args.name, role);
    if let Some(raw) = args.email.as_deref() {
        let email = Email::parse(raw)
            .map_err(|e| CommandError::InvalidArgument(format!("email '{raw}': {e}")))?;
        identity = identity.with_email(email);
    }
    if let Some(id) = args.building_id {
        identity = identity.with_building(BuildingId::new(id));
    }
    if let Some(id) = args.admin_id {
        identity = identity.with_admin(AdminId::new(id));
    }

    Ok(Session::new(args.token.trim(), identity))
}

/// Store a new session, replacing any previous one.
///
/// # Errors
///
/// Returns `CommandError` if the arguments are invalid or the session file
/// cannot be written.
pub fn login(config: &ReportsConfig, args: LoginArgs) -> Result<(), CommandError> {
    let session = build_session(args)?;
    SessionStore::new(&config.session_file).save(&session)?;

    let identity = session.identity();
    tracing::info!("Logged in as {} ({})", identity.name, identity.role);
    Ok(())
}

/// Forget the stored session.
///
/// # Errors
///
/// Returns `CommandError` if the session file cannot be removed.
pub fn logout(config: &ReportsConfig) -> Result<(), CommandError> {
    SessionStore::new(&config.session_file).clear()?;
    tracing::info!("Logged out");
    Ok(())
}

/// Show the stored identity.
///
/// # Errors
///
/// Returns `CommandError` if no session is stored.
pub fn whoami(config: &ReportsConfig) -> Result<(), CommandError> {
    let session = SessionStore::new(&config.session_file).require()?;
    let identity = session.identity();

    tracing::info!("User {}: {} ({})", identity.user_id, identity.name, identity.role);
    if let Some(email) = &identity.email {
        tracing::info!("Email: {email}");
    }
    if let Some(building_id) = identity.building_id {
        tracing::info!("Building: {building_id}");
    }
    if let Some(admin_id) = identity.admin_id {
        tracing::info!("Vendor admin account: {admin_id}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(role: &str) -> LoginArgs {
        LoginArgs {
            token: " tok-1 ".to_owned(),
            role: role.to_owned(),
            user_id: 7,
            name: "Asha".to_owned(),
            email: Some("asha@cashe.co".to_owned()),
            building_id: Some(3),
            admin_id: None,
        }
    }

    #[test]
    fn test_build_session() {
        let session = build_session(args("building_manager")).unwrap();
        let identity = session.identity();
        assert_eq!(identity.role, Role::BuildingManager);
        assert_eq!(identity.building_id, Some(BuildingId::new(3)));
        assert_eq!(identity.email.as_ref().unwrap().company_key(), "cashe.co");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!(matches!(
            build_session(args("owner")),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let mut bad = args("hr");
        bad.email = Some("no-at-sign".to_owned());
        assert!(matches!(build_session(bad), Err(CommandError::InvalidArgument(_))));
    }
}
