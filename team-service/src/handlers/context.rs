//! Who is calling, and what they may touch.

use service_core::error::AppError;

use crate::models::{User, ROLE_ADMIN, ROLE_SYSTEM_ADMIN};

/// The authenticated caller, as established by whatever sits in front of the
/// flows. An empty `team_id` means the session is not attached to a team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub team_id: String,
    /// Space separated role names.
    pub roles: String,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        team_id: impl Into<String>,
        roles: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            team_id: team_id.into(),
            roles: roles.into(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.split_whitespace().any(|r| r == role)
    }

    pub fn is_team_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_SYSTEM_ADMIN)
    }
}

/// Per-request context handed to flows that act on behalf of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub session: Session,
    /// Base URL links are built from.
    pub site_url: String,
    /// URL of the caller's team, used for links back into it.
    pub team_url: String,
}

impl RequestContext {
    pub fn new(session: Session, site_url: impl Into<String>) -> Self {
        Self {
            session,
            site_url: site_url.into(),
            team_url: String::new(),
        }
    }

    pub fn with_team_url(mut self, team_url: impl Into<String>) -> Self {
        self.team_url = team_url.into();
        self
    }

    pub fn has_permissions_to_team(&self, team_id: &str, action: &str) -> Result<(), AppError> {
        if !self.session.team_id.is_empty() && self.session.team_id == team_id {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.session.user_id,
            team_id = %team_id,
            action = %action,
            "Session does not belong to team"
        );
        Err(AppError::Forbidden(anyhow::anyhow!(
            "You do not have the appropriate permissions"
        )))
    }

    pub fn require_admin(&self, action: &str) -> Result<(), AppError> {
        if self.session.is_team_admin() {
            return Ok(());
        }

        tracing::warn!(
            user_id = %self.session.user_id,
            action = %action,
            "Admin role required"
        );
        Err(AppError::Forbidden(anyhow::anyhow!(
            "You do not have the appropriate permissions (admin)"
        )))
    }
}

/// How an inviter is described in invitation mail.
pub fn sender_status(user: &User) -> &'static str {
    if user.is_admin() {
        "administrator"
    } else {
        "member"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(team_id: &str, roles: &str) -> RequestContext {
        RequestContext::new(Session::new("u1", team_id, roles), "http://localhost")
    }

    #[test]
    fn test_team_permission() {
        assert!(ctx("t1", "").has_permissions_to_team("t1", "test").is_ok());
        assert!(matches!(
            ctx("t1", "").has_permissions_to_team("t2", "test"),
            Err(AppError::Forbidden(_))
        ));
        assert!(ctx("", "").has_permissions_to_team("", "test").is_err());
    }

    #[test]
    fn test_admin_roles() {
        assert!(ctx("t1", "admin").require_admin("test").is_ok());
        assert!(ctx("t1", "system_admin").require_admin("test").is_ok());
        assert!(ctx("t1", "assistant").require_admin("test").is_err());
        assert!(ctx("t1", "administrator").require_admin("test").is_err());
    }

    #[test]
    fn test_sender_status() {
        let mut user = User::new("t1", "alice", "alice@acme.com");
        assert_eq!(sender_status(&user), "member");
        user.roles = ROLE_ADMIN.to_string();
        assert_eq!(sender_status(&user), "administrator");
    }
}
