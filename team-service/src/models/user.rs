use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::{now_millis, InvalidField};
use crate::utils::{is_valid_id, new_id, normalize_email};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SYSTEM_ADMIN: &str = "system_admin";
pub const ROLE_ASSISTANT: &str = "assistant";

const KNOWN_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_SYSTEM_ADMIN, ROLE_ASSISTANT];

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_EMAIL_LENGTH: usize = 128;
const MAX_FULL_NAME_LENGTH: usize = 64;

/// A team member. Users belong to exactly one team; emails are unique per team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    #[serde(default)]
    pub team_id: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub full_name: String,
    /// Space separated role names.
    #[serde(default)]
    pub roles: String,
}

impl User {
    pub fn new(
        team_id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
            team_id: team_id.into(),
            username: username.into(),
            password_hash: String::new(),
            email: email.into(),
            email_verified: false,
            full_name: String::new(),
            roles: String::new(),
        }
    }

    pub fn pre_save(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        self.create_at = now_millis();
        self.update_at = self.create_at;
        self.username = self.username.trim().to_lowercase();
        self.email = normalize_email(&self.email);
        self.full_name = self.full_name.trim().to_string();
    }

    pub fn is_valid(&self) -> Result<(), InvalidField> {
        let invalid = |field| Err(InvalidField::new("user", field));

        if !is_valid_id(&self.id) {
            return invalid("id");
        }
        if !is_valid_id(&self.team_id) {
            return invalid("team_id");
        }
        if self.create_at == 0 {
            return invalid("create_at");
        }
        if self.update_at == 0 {
            return invalid("update_at");
        }
        if !is_valid_username(&self.username) {
            return invalid("username");
        }
        if self.email.len() > MAX_EMAIL_LENGTH || !self.email.validate_email() {
            return invalid("email");
        }
        if self.full_name.chars().count() > MAX_FULL_NAME_LENGTH {
            return invalid("full_name");
        }
        if !self
            .roles
            .split_whitespace()
            .all(|role| KNOWN_ROLES.contains(&role))
        {
            return invalid("roles");
        }
        Ok(())
    }

    /// Validate a user that has not been saved yet, as if it were about to
    /// join a freshly created team.
    pub fn is_valid_for_create(&self) -> Result<(), InvalidField> {
        let mut probe = self.clone();
        if probe.team_id.is_empty() {
            probe.team_id = new_id();
        }
        probe.pre_save();
        probe.is_valid()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.split_whitespace().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_SYSTEM_ADMIN)
    }

    /// Name shown to other people: full name when set, otherwise the username.
    pub fn display_name(&self) -> &str {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            &self.username
        } else {
            full_name
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    let mut chars = username.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }

    username.len() <= MAX_USERNAME_LENGTH
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c))
}
