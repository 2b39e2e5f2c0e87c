use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Team, User};
use crate::services::ProvisioningFailure;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SignupTeamRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 64, message = "Team name must be 1 to 64 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SignupTeamResponse {
    pub email: String,
    pub name: String,
    /// Only populated in dev mode, so a signup can be completed without mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_link: Option<String>,
}

/// Team fields a caller chooses when creating a team.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NewTeam {
    #[validate(length(min = 1, max = 64, message = "Team name must be 1 to 64 characters"))]
    pub name: String,

    #[validate(length(min = 4, max = 64, message = "URL must be 4 to 64 characters"))]
    pub url_id: String,

    #[serde(default)]
    pub company_name: String,
}

/// The first account of a new team.
#[derive(Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 64, message = "Username must be 1 to 64 characters"))]
    pub username: String,

    #[serde(default)]
    pub full_name: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Body of the signup completion page. The email comes from the signed
/// `data`, never from the body.
#[derive(Debug, Deserialize)]
pub struct TeamSignup {
    pub team: NewTeam,
    pub user: NewUser,
    #[serde(default)]
    pub invites: Vec<String>,
    /// Signed payload (`d` of the link).
    pub data: String,
    /// Tag over `data` (`h` of the link).
    pub hash: String,
}

/// Dev-mode team creation without a signup link.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 64, message = "Team name must be 1 to 64 characters"))]
    pub name: String,

    #[validate(length(min = 4, max = 64, message = "URL must be 4 to 64 characters"))]
    pub url_id: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FindTeamsRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Invites {
    pub invites: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTeamNameRequest {
    #[validate(length(min = 1, max = 64, message = "Team name must be 1 to 64 characters"))]
    pub new_name: String,

    /// Defaults to the session's team.
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAssistantFeatureRequest {
    pub allow_assistant: bool,

    #[serde(default)]
    pub team_id: Option<String>,
}

/// Result of a team creation. The team exists whenever this is returned;
/// `incomplete` lists the follow-up steps that did not finish.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTeamOutcome {
    pub team: Team,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incomplete: Vec<ProvisioningFailure>,
}

impl CreateTeamOutcome {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InviteMembersResponse {
    pub invited: Vec<String>,
    /// Invitees whose mail could not be sent.
    pub failed: Vec<String>,
}

/// What a valid join link vouches for.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JoinTeamDetails {
    pub email: String,
    pub team_id: String,
    pub team_name: String,
    pub url_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MyTeam {
    /// The session is not attached to a team.
    NoTeam,
    /// The caller's cached copy is current.
    NotModified { etag: String },
    Team { team: Team, etag: String },
}
