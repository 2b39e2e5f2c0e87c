use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;

use crate::config::TeamConfig;
use crate::models::{Channel, Team, User, ROLE_ASSISTANT};
use crate::store::{StoreError, StoreGateway};
use crate::utils::{hash_password, Password};

/// `(name, display name)` of the channels every new team starts with.
pub const DEFAULT_CHANNELS: &[(&str, &str)] = &[
    ("town-square", "Town Square"),
    ("off-topic", "Off-Topic"),
];

pub const ASSISTANT_USERNAME: &str = "assistant";

/// A step that runs after the team record already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    DefaultChannels,
    Assistant,
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            ProvisioningStep::DefaultChannels => "default channels",
            ProvisioningStep::Assistant => "assistant account",
        };
        f.write_str(step)
    }
}

/// Recorded when a post-save step fails. Nothing already written is undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningFailure {
    pub step: ProvisioningStep,
    pub detail: String,
}

impl ProvisioningFailure {
    pub fn new(step: ProvisioningStep, detail: impl fmt::Display) -> Self {
        Self {
            step,
            detail: detail.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Provisioner {
    store: StoreGateway,
    config: Arc<TeamConfig>,
}

impl Provisioner {
    pub fn new(store: StoreGateway, config: Arc<TeamConfig>) -> Self {
        Self { store, config }
    }

    /// Save the default channels of `team`. All saves are issued before the
    /// first one is awaited; the first failure is returned and the rest are
    /// released.
    pub async fn create_default_channels(&self, team: &Team) -> Result<Vec<Channel>, StoreError> {
        let pending = DEFAULT_CHANNELS.iter().map(|(name, display_name)| {
            self.store
                .save_channel(Channel::open(team.id.clone(), name, display_name))
        });

        let channels = try_join_all(pending).await?;
        tracing::info!(team_id = %team.id, count = channels.len(), "Created default channels");
        Ok(channels)
    }

    /// Create the automation account of `team`. Its password is random and
    /// never shown to anyone.
    pub async fn create_assistant(&self, team: &Team) -> Result<User, StoreError> {
        let mut assistant = User::new(
            team.id.clone(),
            ASSISTANT_USERNAME,
            self.config.teams.assistant_email.clone(),
        );
        assistant.full_name = "Assistant".to_string();
        assistant.roles = ROLE_ASSISTANT.to_string();
        assistant.email_verified = true;

        let password = Password::new(random_password());
        assistant.password_hash =
            hash_password(&password).map_err(|e| StoreError::Invalid(e.to_string()))?;

        let assistant = self.store.save_user(assistant).await?;
        tracing::info!(team_id = %team.id, user_id = %assistant.id, "Created assistant account");
        Ok(assistant)
    }
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
