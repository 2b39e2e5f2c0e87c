use std::sync::Arc;

use super::{StoreBackend, StoreError, StoreFuture};
use crate::models::{Channel, Team, User};

/// Non-blocking front for a [`StoreBackend`]. Cheap to clone.
///
/// Every method must be called from within a tokio runtime.
#[derive(Clone)]
pub struct StoreGateway {
    backend: Arc<dyn StoreBackend>,
}

impl StoreGateway {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn get_team_by_id(&self, id: impl Into<String>) -> StoreFuture<Team> {
        let id = id.into();
        if id.is_empty() {
            return StoreFuture::ready(Err(StoreError::not_found("team", id)));
        }
        let backend = Arc::clone(&self.backend);
        StoreFuture::spawn(async move { backend.get_team_by_id(&id).await })
    }

    pub fn get_team_by_url_id(&self, url_id: impl Into<String>) -> StoreFuture<Team> {
        let backend = Arc::clone(&self.backend);
        let url_id = url_id.into();
        StoreFuture::spawn(async move { backend.get_team_by_url_id(&url_id).await })
    }

    pub fn get_teams_by_email(&self, email: impl Into<String>) -> StoreFuture<Vec<Team>> {
        let backend = Arc::clone(&self.backend);
        let email = email.into();
        StoreFuture::spawn(async move { backend.get_teams_by_email(&email).await })
    }

    pub fn save_team(&self, team: Team) -> StoreFuture<Team> {
        let backend = Arc::clone(&self.backend);
        StoreFuture::spawn(async move { backend.save_team(team).await })
    }

    pub fn update_team(&self, team: Team) -> StoreFuture<Team> {
        let backend = Arc::clone(&self.backend);
        StoreFuture::spawn(async move { backend.update_team(team).await })
    }

    pub fn update_team_name(
        &self,
        name: impl Into<String>,
        team_id: impl Into<String>,
    ) -> StoreFuture<()> {
        let backend = Arc::clone(&self.backend);
        let (name, team_id) = (name.into(), team_id.into());
        StoreFuture::spawn(async move { backend.update_team_name(&name, &team_id).await })
    }

    pub fn get_user_by_id(&self, id: impl Into<String>) -> StoreFuture<User> {
        let id = id.into();
        if id.is_empty() {
            return StoreFuture::ready(Err(StoreError::not_found("account", id)));
        }
        let backend = Arc::clone(&self.backend);
        StoreFuture::spawn(async move { backend.get_user_by_id(&id).await })
    }

    pub fn get_user_by_email(
        &self,
        team_id: impl Into<String>,
        email: impl Into<String>,
    ) -> StoreFuture<User> {
        let backend = Arc::clone(&self.backend);
        let (team_id, email) = (team_id.into(), email.into());
        StoreFuture::spawn(async move { backend.get_user_by_email(&team_id, &email).await })
    }

    pub fn save_user(&self, user: User) -> StoreFuture<User> {
        let backend = Arc::clone(&self.backend);
        StoreFuture::spawn(async move { backend.save_user(user).await })
    }

    pub fn save_channel(&self, channel: Channel) -> StoreFuture<Channel> {
        let backend = Arc::clone(&self.backend);
        StoreFuture::spawn(async move { backend.save_channel(channel).await })
    }

    pub fn get_channels_by_team(&self, team_id: impl Into<String>) -> StoreFuture<Vec<Channel>> {
        let backend = Arc::clone(&self.backend);
        let team_id = team_id.into();
        StoreFuture::spawn(async move { backend.get_channels_by_team(&team_id).await })
    }
}
