pub mod channel;
pub mod team;
pub mod user;

pub use channel::{Channel, ChannelType};
pub use team::{Team, TeamType};
pub use user::{User, ROLE_ADMIN, ROLE_ASSISTANT, ROLE_SYSTEM_ADMIN};

use service_core::error::AppError;
use thiserror::Error;

/// A record field that failed its shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity}.{field} is invalid")]
pub struct InvalidField {
    pub entity: &'static str,
    pub field: &'static str,
}

impl InvalidField {
    pub(crate) fn new(entity: &'static str, field: &'static str) -> Self {
        Self { entity, field }
    }
}

impl From<InvalidField> for AppError {
    fn from(err: InvalidField) -> Self {
        AppError::InvalidParam(format!("{}.{}", err.entity, err.field))
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
