use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{StoreBackend, StoreError, StoreResult};
use crate::models::{Channel, Team, User};
use crate::utils::normalize_email;

/// In-process [`StoreBackend`].
///
/// Unique keys (team URL id, per-team user email and username, per-team
/// channel name) are claimed through `DashMap` entries so that concurrent
/// saves of the same key resolve to exactly one winner. No method awaits
/// while holding a guard.
#[derive(Default)]
pub struct MemoryStore {
    teams: DashMap<String, Team>,
    team_urls: DashMap<String, String>,
    users: DashMap<String, User>,
    user_emails: DashMap<(String, String), String>,
    user_names: DashMap<(String, String), String>,
    channels: DashMap<String, Channel>,
    channel_names: DashMap<(String, String), String>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as if the engine were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn team(&self, id: &str) -> StoreResult<Team> {
        self.teams
            .get(id)
            .map(|team| team.clone())
            .ok_or_else(|| StoreError::not_found("team", id))
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get_team_by_id(&self, id: &str) -> StoreResult<Team> {
        self.ensure_available()?;
        self.team(id)
    }

    async fn get_team_by_url_id(&self, url_id: &str) -> StoreResult<Team> {
        self.ensure_available()?;
        let key = url_id.trim().to_lowercase();
        let id = self
            .team_urls
            .get(&key)
            .map(|id| id.clone())
            .ok_or_else(|| StoreError::not_found("team", key.clone()))?;
        self.team(&id)
    }

    async fn get_teams_by_email(&self, email: &str) -> StoreResult<Vec<Team>> {
        self.ensure_available()?;
        let email = normalize_email(email);
        let mut teams: Vec<Team> = self
            .teams
            .iter()
            .filter(|team| team.email == email)
            .map(|team| team.clone())
            .collect();
        teams.sort_by(|a, b| a.url_id.cmp(&b.url_id));
        Ok(teams)
    }

    async fn save_team(&self, mut team: Team) -> StoreResult<Team> {
        self.ensure_available()?;
        if !team.id.is_empty() {
            return Err(StoreError::Invalid(
                "Must call update for an existing team".to_string(),
            ));
        }
        team.pre_save();
        team.is_valid()?;

        match self.team_urls.entry(team.url_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(
                "A team with that URL identifier already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                self.teams.insert(team.id.clone(), team.clone());
                slot.insert(team.id.clone());
                Ok(team)
            }
        }
    }

    async fn update_team(&self, mut team: Team) -> StoreResult<Team> {
        self.ensure_available()?;
        let mut stored = self
            .teams
            .get_mut(&team.id)
            .ok_or_else(|| StoreError::not_found("team", team.id.clone()))?;

        team.url_id = stored.url_id.clone();
        team.create_at = stored.create_at;
        team.pre_update();
        team.is_valid()?;

        *stored = team.clone();
        Ok(team)
    }

    async fn update_team_name(&self, name: &str, team_id: &str) -> StoreResult<()> {
        self.ensure_available()?;
        let mut stored = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| StoreError::not_found("team", team_id))?;

        let mut renamed = stored.clone();
        renamed.name = name.to_string();
        renamed.pre_update();
        renamed.is_valid()?;

        *stored = renamed;
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> StoreResult<User> {
        self.ensure_available()?;
        self.users
            .get(id)
            .map(|user| user.clone())
            .ok_or_else(|| StoreError::not_found("account", id))
    }

    async fn get_user_by_email(&self, team_id: &str, email: &str) -> StoreResult<User> {
        self.ensure_available()?;
        let email = normalize_email(email);
        let id = self
            .user_emails
            .get(&(team_id.to_string(), email.clone()))
            .map(|id| id.clone())
            .ok_or_else(|| StoreError::not_found("account", email))?;
        self.get_user_by_id(&id).await
    }

    async fn save_user(&self, mut user: User) -> StoreResult<User> {
        self.ensure_available()?;
        if !user.id.is_empty() {
            return Err(StoreError::Invalid(
                "Must call update for an existing user".to_string(),
            ));
        }
        user.pre_save();
        user.is_valid()?;
        self.team(&user.team_id)?;

        let email_key = (user.team_id.clone(), user.email.clone());
        let name_key = (user.team_id.clone(), user.username.clone());

        match self.user_emails.entry(email_key) {
            Entry::Occupied(_) => Err(StoreError::Conflict(
                "An account with that email already exists".to_string(),
            )),
            Entry::Vacant(email_slot) => match self.user_names.entry(name_key) {
                Entry::Occupied(_) => Err(StoreError::Conflict(
                    "An account with that username already exists".to_string(),
                )),
                Entry::Vacant(name_slot) => {
                    self.users.insert(user.id.clone(), user.clone());
                    name_slot.insert(user.id.clone());
                    email_slot.insert(user.id.clone());
                    Ok(user)
                }
            },
        }
    }

    async fn save_channel(&self, mut channel: Channel) -> StoreResult<Channel> {
        self.ensure_available()?;
        channel.pre_save();
        channel.is_valid()?;
        self.team(&channel.team_id)?;

        match self
            .channel_names
            .entry((channel.team_id.clone(), channel.name.clone()))
        {
            Entry::Occupied(_) => Err(StoreError::Conflict(
                "A channel with that name already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                self.channels.insert(channel.id.clone(), channel.clone());
                slot.insert(channel.id.clone());
                Ok(channel)
            }
        }
    }

    async fn get_channels_by_team(&self, team_id: &str) -> StoreResult<Vec<Channel>> {
        self.ensure_available()?;
        let mut channels: Vec<Channel> = self
            .channels
            .iter()
            .filter(|channel| channel.team_id == team_id)
            .map(|channel| channel.clone())
            .collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels)
    }
}
