use async_trait::async_trait;

use super::StoreResult;
use crate::models::{Channel, Team, User};

/// The persistence engine behind [`super::StoreGateway`].
///
/// Each method must be atomic: if the calling task is aborted at an await
/// point, either the whole write is visible or none of it is. Conflicting
/// writes to the same record are serialized by the implementation.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn get_team_by_id(&self, id: &str) -> StoreResult<Team>;

    async fn get_team_by_url_id(&self, url_id: &str) -> StoreResult<Team>;

    async fn get_teams_by_email(&self, email: &str) -> StoreResult<Vec<Team>>;

    /// Insert a new team. The team must not have an id yet; one is assigned.
    async fn save_team(&self, team: Team) -> StoreResult<Team>;

    /// Replace an existing team. `url_id` and `create_at` are kept.
    async fn update_team(&self, team: Team) -> StoreResult<Team>;

    async fn update_team_name(&self, name: &str, team_id: &str) -> StoreResult<()>;

    async fn get_user_by_id(&self, id: &str) -> StoreResult<User>;

    async fn get_user_by_email(&self, team_id: &str, email: &str) -> StoreResult<User>;

    async fn save_user(&self, user: User) -> StoreResult<User>;

    async fn save_channel(&self, channel: Channel) -> StoreResult<Channel>;

    async fn get_channels_by_team(&self, team_id: &str) -> StoreResult<Vec<Channel>>;
}
