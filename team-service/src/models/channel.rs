use serde::{Deserialize, Serialize};

use super::{now_millis, InvalidField};
use crate::utils::{is_valid_id, new_id};

const MAX_NAME_LENGTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub create_at: i64,
    pub team_id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default, rename = "type")]
    pub channel_type: ChannelType,
}

impl Channel {
    pub fn open(team_id: impl Into<String>, name: &str, display_name: &str) -> Self {
        Self {
            id: String::new(),
            create_at: 0,
            team_id: team_id.into(),
            name: name.to_string(),
            display_name: display_name.to_string(),
            channel_type: ChannelType::Open,
        }
    }

    pub fn pre_save(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        self.create_at = now_millis();
    }

    pub fn is_valid(&self) -> Result<(), InvalidField> {
        let invalid = |field| Err(InvalidField::new("channel", field));

        if !is_valid_id(&self.id) {
            return invalid("id");
        }
        if !is_valid_id(&self.team_id) {
            return invalid("team_id");
        }
        if self.name.is_empty()
            || self.name.len() > MAX_NAME_LENGTH
            || !self
                .name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return invalid("name");
        }
        if self.display_name.trim().is_empty()
            || self.display_name.chars().count() > MAX_NAME_LENGTH
        {
            return invalid("display_name");
        }
        Ok(())
    }
}
