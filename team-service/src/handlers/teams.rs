//! Team onboarding flows.
//!
//! - Signup: mail a team creation link, then create the team from it
//! - Invitations: mail join links to new members
//! - Lookup and maintenance of existing teams

use std::sync::Arc;

use futures::future::join_all;
use service_core::error::AppError;
use validator::{Validate, ValidateEmail};

use super::context::{sender_status, RequestContext};
use crate::config::TeamConfig;
use crate::dtos::{
    CreateTeamOutcome, CreateTeamRequest, FindTeamsRequest, InviteMembersResponse, Invites,
    JoinTeamDetails, MyTeam, SignupTeamRequest, SignupTeamResponse, TeamSignup,
    UpdateAssistantFeatureRequest, UpdateTeamNameRequest,
};
use crate::models::{Team, User, ROLE_ADMIN};
use crate::services::{notices, Mailer, Provisioner, ProvisioningFailure, ProvisioningStep};
use crate::store::StoreGateway;
use crate::token::{InviteContext, InviteFlow, InviteTokens};
use crate::utils::{hash_password, is_reserved_url_id, normalize_email, Password, ID_LENGTH};

const URL_UNAVAILABLE: &str = "This URL is unavailable. Please try another.";
const MAX_URL_ID_LOOKUP_LENGTH: usize = 64;

#[derive(Clone)]
pub struct TeamHandlers {
    config: Arc<TeamConfig>,
    store: StoreGateway,
    mailer: Arc<dyn Mailer>,
    tokens: InviteTokens,
    provisioner: Provisioner,
}

impl TeamHandlers {
    pub fn new(config: Arc<TeamConfig>, store: StoreGateway, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = InviteTokens::new(config.invite.secret.clone());
        let provisioner = Provisioner::new(store.clone(), Arc::clone(&config));

        Self {
            config,
            store,
            mailer,
            tokens,
            provisioner,
        }
    }

    pub fn tokens(&self) -> &InviteTokens {
        &self.tokens
    }

    /// Mail a team creation link to `req.email`. The mail is the whole point
    /// of the call, so a failed send fails the request.
    #[tracing::instrument(skip(self, req), fields(email = %req.email))]
    pub async fn signup_team(&self, req: SignupTeamRequest) -> Result<SignupTeamResponse, AppError> {
        let req = SignupTeamRequest {
            email: normalize_email(&req.email),
            name: req.name.trim().to_string(),
        };
        if req.email.is_empty() {
            return Err(AppError::InvalidParam("email".to_string()));
        }
        if req.name.is_empty() {
            return Err(AppError::InvalidParam("name".to_string()));
        }
        req.validate()?;

        let issued = self
            .tokens
            .issue(InviteContext::create_team(req.email.as_str(), req.name.as_str()))?;
        let link = issued.link(&self.config.site_url);

        if self.config.is_dev_mode() {
            tracing::info!(link = %link, "Issued team signup link");
        }

        let notice = notices::signup_team(&self.config.site_name, &link);
        self.mailer
            .send(&req.email, &notice.subject, &notice.body)
            .await?;

        tracing::info!(expires_at = ?issued.expires_at(), "Team signup mail sent");

        Ok(SignupTeamResponse {
            email: req.email,
            name: req.name,
            follow_link: self.config.is_dev_mode().then_some(link),
        })
    }

    /// Create a team from a signup link.
    ///
    /// Once the team record is saved nothing is rolled back. Failed default
    /// channels or assistant account are listed in
    /// [`CreateTeamOutcome::incomplete`]; a failed first account is returned
    /// as [`AppError::PartialCompletion`].
    #[tracing::instrument(skip(self, signup), fields(url_id = %signup.team.url_id))]
    pub async fn create_team_from_signup(
        &self,
        signup: TeamSignup,
    ) -> Result<CreateTeamOutcome, AppError> {
        let context = self
            .tokens
            .validate(InviteFlow::CreateTeam, &signup.data, &signup.hash)?;
        let email = context.email().to_string();

        signup.team.validate()?;
        signup.user.validate()?;

        let mut team = Team::new(signup.team.name, signup.team.url_id, email.as_str());
        team.company_name = signup.team.company_name;
        team.is_valid_for_create()?;

        let password = Password::new(signup.user.password);
        if password.is_empty() {
            return Err(AppError::InvalidParam("user.password".to_string()));
        }

        let mut user = User::new(String::new(), signup.user.username, email);
        user.full_name = signup.user.full_name;
        user.is_valid_for_create()?;

        if self.find_team_by_url_id(&team.url_id).await? {
            return Err(AppError::Conflict(anyhow::anyhow!(URL_UNAVAILABLE)));
        }

        team.allow_assistant = self.config.teams.allow_assistant_default;
        let password_hash = hash_password(&password)?;

        let team = self.store.save_team(team).await?;
        tracing::info!(team_id = %team.id, "Team created from signup link");

        let mut incomplete = Vec::new();
        if let Some(failure) = self.create_default_channels(&team).await {
            incomplete.push(failure);
        }

        user.team_id = team.id.clone();
        user.email_verified = true;
        user.roles = ROLE_ADMIN.to_string();
        user.password_hash = password_hash;

        let user = match self.store.save_user(user).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(team_id = %team.id, error = %e, "Team saved but first account failed");
                return Err(AppError::PartialCompletion(anyhow::anyhow!(
                    "The team {} was created but its first account could not be: {}",
                    team.url_id,
                    e
                )));
            }
        };

        if team.allow_assistant {
            if let Some(failure) = self.create_assistant(&team).await {
                incomplete.push(failure);
            }
        }

        if !signup.invites.is_empty() {
            let team_url = format!("{}/{}", self.config.site_url, team.url_id);
            let invites: Vec<String> = signup
                .invites
                .iter()
                .map(|email| normalize_email(email))
                .filter(|email| !email.is_empty())
                .collect();
            self.send_invites(&team, &user, &team_url, &invites).await;
        }

        Ok(CreateTeamOutcome {
            team,
            user: Some(user),
            incomplete,
        })
    }

    /// Create a team without a signup link. Only allowed in dev mode.
    #[tracing::instrument(skip(self, req), fields(url_id = %req.url_id))]
    pub async fn create_team(&self, req: CreateTeamRequest) -> Result<CreateTeamOutcome, AppError> {
        if !self.config.is_dev_mode() {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "The mode does not allow network creation without a valid invite"
            )));
        }
        req.validate()?;

        let mut team = Team::new(req.name, req.url_id, req.email);
        team.allow_assistant = self.config.teams.allow_assistant_default;
        team.is_valid_for_create()?;

        let team = self.store.save_team(team).await?;
        tracing::info!(team_id = %team.id, "Team created");

        let mut incomplete = Vec::new();
        if let Some(failure) = self.create_default_channels(&team).await {
            incomplete.push(failure);
        }
        if team.allow_assistant {
            if let Some(failure) = self.create_assistant(&team).await {
                incomplete.push(failure);
            }
        }

        Ok(CreateTeamOutcome {
            team,
            user: None,
            incomplete,
        })
    }

    /// Whether a team already holds `url_id`. Reserved words are reported as
    /// a conflict rather than as taken.
    #[tracing::instrument(skip(self))]
    pub async fn find_team_by_url_id(&self, url_id: &str) -> Result<bool, AppError> {
        let url_id = url_id.trim().to_lowercase();

        if url_id.is_empty() || url_id.len() > MAX_URL_ID_LOOKUP_LENGTH {
            return Err(AppError::InvalidParam("url_id".to_string()));
        }
        if is_reserved_url_id(&url_id) {
            return Err(AppError::Conflict(anyhow::anyhow!(URL_UNAVAILABLE)));
        }

        match self.store.get_team_by_url_id(url_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// URL ids of the teams registered under an email address.
    #[tracing::instrument(skip(self, req))]
    pub async fn find_teams(&self, req: FindTeamsRequest) -> Result<Vec<String>, AppError> {
        let email = checked_email(&req.email)?;

        let teams = self.store.get_teams_by_email(email).await?;
        Ok(teams.into_iter().map(|team| team.url_id).collect())
    }

    /// Mail the caller the list of their teams. A failed send is only logged.
    #[tracing::instrument(skip(self, req))]
    pub async fn email_teams(&self, req: FindTeamsRequest) -> Result<(), AppError> {
        let email = checked_email(&req.email)?;

        let teams = self.store.get_teams_by_email(email.as_str()).await?;
        let links: Vec<String> = teams
            .iter()
            .map(|team| format!("{}/{}", self.config.site_url, team.url_id))
            .collect();

        let notice = notices::find_teams(&self.config.site_name, &links);
        if let Err(e) = self.mailer.send(&email, &notice.subject, &notice.body).await {
            tracing::error!(error = %e, "Failed to send find-teams email");
        }

        Ok(())
    }

    /// Mail join links on behalf of the session user. Rejects the whole batch
    /// when any invitee already has an account on the team.
    #[tracing::instrument(
        skip(self, ctx, invites),
        fields(team_id = %ctx.session.team_id, user_id = %ctx.session.user_id)
    )]
    pub async fn invite_members(
        &self,
        ctx: &RequestContext,
        invites: Invites,
    ) -> Result<InviteMembersResponse, AppError> {
        if invites.invites.is_empty() {
            return Err(AppError::InvalidParam("invites".to_string()));
        }

        let mut emails = Vec::with_capacity(invites.invites.len());
        for (index, invite) in invites.invites.iter().enumerate() {
            let email = normalize_email(invite);
            if !email.validate_email() {
                return Err(AppError::InvalidParam(format!("invites[{}]", index)));
            }
            emails.push(email);
        }

        // Both lookups are in flight before either is awaited. If the team
        // lookup fails, the user lookup is dropped and cancelled with it.
        let team = self.store.get_team_by_id(ctx.session.team_id.as_str());
        let user = self.store.get_user_by_id(ctx.session.user_id.as_str());
        let team = team.await?;
        let user = user.await?;

        let lookups = emails
            .iter()
            .map(|email| self.store.get_user_by_email(team.id.as_str(), email.as_str()));
        for (index, existing) in join_all(lookups).await.into_iter().enumerate() {
            match existing {
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
                Ok(_) => {
                    return Err(AppError::Conflict(anyhow::anyhow!(
                        "This person is already on your team (invite {})",
                        index
                    )))
                }
            }
        }

        let team_url = if ctx.team_url.is_empty() {
            format!("{}/{}", ctx.site_url.trim_end_matches('/'), team.url_id)
        } else {
            ctx.team_url.clone()
        };

        Ok(self.send_invites(&team, &user, &team_url, &emails).await)
    }

    #[tracing::instrument(skip(self, ctx, req), fields(user_id = %ctx.session.user_id))]
    pub async fn update_team_name(
        &self,
        ctx: &RequestContext,
        req: UpdateTeamNameRequest,
    ) -> Result<(), AppError> {
        let new_name = req.new_name.trim().to_string();
        if new_name.is_empty() {
            return Err(AppError::InvalidParam("new_name".to_string()));
        }
        let team_id = resolve_team_id(ctx, req.team_id.as_deref())?;
        UpdateTeamNameRequest {
            new_name: new_name.clone(),
            team_id: None,
        }
        .validate()?;

        ctx.has_permissions_to_team(&team_id, "update_team_name")?;
        ctx.require_admin("update_team_name")?;

        self.store
            .update_team_name(new_name.as_str(), team_id.as_str())
            .await?;
        tracing::info!(team_id = %team_id, "Team renamed");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx, req), fields(user_id = %ctx.session.user_id))]
    pub async fn update_assistant_feature(
        &self,
        ctx: &RequestContext,
        req: UpdateAssistantFeatureRequest,
    ) -> Result<Team, AppError> {
        let team_id = resolve_team_id(ctx, req.team_id.as_deref())?;

        // Started before the permission checks; dropped unread if they fail.
        let team = self.store.get_team_by_id(team_id.as_str());

        ctx.has_permissions_to_team(&team_id, "update_assistant_feature")?;
        ctx.require_admin("update_assistant_feature")?;

        let mut team = team.await?;
        team.allow_assistant = req.allow_assistant;

        let team = self.store.update_team(team).await?;
        tracing::info!(team_id = %team.id, allow_assistant = team.allow_assistant, "Assistant feature updated");
        Ok(team)
    }

    /// The session's team, or `NotModified` when `if_none_match` already
    /// carries its current etag.
    #[tracing::instrument(skip(self, ctx), fields(team_id = %ctx.session.team_id))]
    pub async fn get_my_team(
        &self,
        ctx: &RequestContext,
        if_none_match: Option<&str>,
    ) -> Result<MyTeam, AppError> {
        if ctx.session.team_id.is_empty() {
            return Ok(MyTeam::NoTeam);
        }

        let team = self
            .store
            .get_team_by_id(ctx.session.team_id.as_str())
            .await?;
        let etag = team.etag();

        if if_none_match == Some(etag.as_str()) {
            return Ok(MyTeam::NotModified { etag });
        }
        Ok(MyTeam::Team { team, etag })
    }

    /// Check a join link and describe the team it leads to.
    #[tracing::instrument(skip(self, payload, tag))]
    pub async fn complete_user_signup(
        &self,
        payload: &str,
        tag: &str,
    ) -> Result<JoinTeamDetails, AppError> {
        let context = self.tokens.validate(InviteFlow::JoinTeam, payload, tag)?;

        let InviteContext::JoinTeam {
            email,
            team_id,
            url_id,
            ..
        } = context
        else {
            return Err(AppError::InvalidLink(anyhow::anyhow!(
                "join link decoded to another flow"
            )));
        };

        let team = self.store.get_team_by_id(team_id).await?;
        if team.url_id != url_id {
            return Err(AppError::InvalidLink(anyhow::anyhow!(
                "join link points at a team whose URL changed"
            )));
        }

        Ok(JoinTeamDetails {
            email,
            team_id: team.id,
            team_name: team.name,
            url_id: team.url_id,
        })
    }

    async fn create_default_channels(&self, team: &Team) -> Option<ProvisioningFailure> {
        match self.provisioner.create_default_channels(team).await {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(team_id = %team.id, error = %e, "Failed to create default channels");
                Some(ProvisioningFailure::new(ProvisioningStep::DefaultChannels, e))
            }
        }
    }

    async fn create_assistant(&self, team: &Team) -> Option<ProvisioningFailure> {
        match self.provisioner.create_assistant(team).await {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(team_id = %team.id, error = %e, "Failed to create assistant account");
                Some(ProvisioningFailure::new(ProvisioningStep::Assistant, e))
            }
        }
    }

    /// One join link per invitee. Every send is best effort.
    async fn send_invites(
        &self,
        team: &Team,
        sender: &User,
        team_url: &str,
        invites: &[String],
    ) -> InviteMembersResponse {
        let mut response = InviteMembersResponse::default();

        for invite in invites {
            let context = InviteContext::join_team(
                invite.as_str(),
                team.id.as_str(),
                team.name.as_str(),
                team.url_id.as_str(),
            );
            let issued = match self.tokens.issue(context) {
                Ok(issued) => issued,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to issue invitation link");
                    response.failed.push(invite.clone());
                    continue;
                }
            };
            let link = issued.link(team_url);

            if self.config.is_dev_mode() {
                tracing::info!(to = %invite, link = %link, "Sending invitation");
            }

            let notice = notices::invite(
                sender.display_name(),
                sender_status(sender),
                &team.name,
                &link,
            );
            match self.mailer.send(invite, &notice.subject, &notice.body).await {
                Ok(()) => response.invited.push(invite.clone()),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to send invite email");
                    response.failed.push(invite.clone());
                }
            }
        }

        response
    }
}

fn checked_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(AppError::InvalidParam("email".to_string()));
    }
    FindTeamsRequest {
        email: email.clone(),
    }
    .validate()?;
    Ok(email)
}

/// An explicit team id must be a well-formed id; otherwise the session's team
/// is used.
fn resolve_team_id(ctx: &RequestContext, requested: Option<&str>) -> Result<String, AppError> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if id.len() != ID_LENGTH => Err(AppError::InvalidParam("team_id".to_string())),
        Some(id) => Ok(id.to_string()),
        None => Ok(ctx.session.team_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::context::Session;

    fn ctx(team_id: &str) -> RequestContext {
        RequestContext::new(Session::new("u1", team_id, ROLE_ADMIN), "http://localhost")
    }

    #[test]
    fn test_resolve_team_id() {
        let session_team = "abcdefghijkmnopqrstuwxyz13";
        assert_eq!(resolve_team_id(&ctx(session_team), None).unwrap(), session_team);
        assert_eq!(
            resolve_team_id(&ctx(session_team), Some("  ")).unwrap(),
            session_team
        );
        assert!(matches!(
            resolve_team_id(&ctx(session_team), Some("short")),
            Err(AppError::InvalidParam(_))
        ));

        let other = "zyxwutsrqponmkjihgfedcba31";
        assert_eq!(resolve_team_id(&ctx(session_team), Some(other)).unwrap(), other);
    }

    #[test]
    fn test_checked_email() {
        assert_eq!(checked_email(" Boss@Acme.com ").unwrap(), "boss@acme.com");
        assert!(matches!(checked_email("  "), Err(AppError::InvalidParam(_))));
        assert!(matches!(
            checked_email("nope"),
            Err(AppError::ValidationError(_))
        ));
    }
}
