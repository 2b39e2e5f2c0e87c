//! Team model.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::{now_millis, InvalidField};
use crate::utils::{is_reserved_url_id, is_valid_id, is_valid_url_id, new_id, normalize_email};

const MAX_EMAIL_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 64;
const MAX_COMPANY_NAME_LENGTH: usize = 64;
const MAX_ALLOWED_DOMAINS_LENGTH: usize = 500;

/// Whether anyone with a matching domain may join, or only invitees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TeamType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "I")]
    Invite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    #[serde(default)]
    pub delete_at: i64,
    pub name: String,
    pub url_id: String,
    pub email: String,
    #[serde(default, rename = "type")]
    pub team_type: TeamType,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub allowed_domains: String,
    /// Provision an automation account for this team.
    #[serde(default)]
    pub allow_assistant: bool,
}

impl Team {
    pub fn new(name: impl Into<String>, url_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
            name: name.into(),
            url_id: url_id.into(),
            email: email.into(),
            team_type: TeamType::Open,
            company_name: String::new(),
            allowed_domains: String::new(),
            allow_assistant: false,
        }
    }

    pub fn pre_save(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        self.create_at = now_millis();
        self.update_at = self.create_at;
        self.name = self.name.trim().to_string();
        self.url_id = self.url_id.trim().to_lowercase();
        self.email = normalize_email(&self.email);
    }

    pub fn pre_update(&mut self) {
        self.update_at = now_millis();
        self.name = self.name.trim().to_string();
    }

    pub fn is_valid(&self) -> Result<(), InvalidField> {
        let invalid = |field| Err(InvalidField::new("team", field));

        if !is_valid_id(&self.id) {
            return invalid("id");
        }
        if self.create_at == 0 {
            return invalid("create_at");
        }
        if self.update_at == 0 {
            return invalid("update_at");
        }
        if self.email.len() > MAX_EMAIL_LENGTH || !self.email.validate_email() {
            return invalid("email");
        }
        if self.name.is_empty() || self.name.chars().count() > MAX_NAME_LENGTH {
            return invalid("name");
        }
        if !is_valid_url_id(&self.url_id) || is_reserved_url_id(&self.url_id) {
            return invalid("url_id");
        }
        if self.company_name.chars().count() > MAX_COMPANY_NAME_LENGTH {
            return invalid("company_name");
        }
        if self.allowed_domains.len() > MAX_ALLOWED_DOMAINS_LENGTH {
            return invalid("allowed_domains");
        }
        Ok(())
    }

    /// Validate a team that has not been saved yet, as it will look after
    /// [`Team::pre_save`].
    pub fn is_valid_for_create(&self) -> Result<(), InvalidField> {
        let mut probe = self.clone();
        probe.pre_save();
        probe.is_valid()
    }

    /// Cache validator that changes on every update.
    pub fn etag(&self) -> String {
        format!("{}.{}.{}", env!("CARGO_PKG_VERSION"), self.id, self.update_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(name: &str, url_id: &str, email: &str) -> Team {
        let mut team = Team::new(name, url_id, email);
        team.pre_save();
        team
    }

    #[test]
    fn test_pre_save_normalizes() {
        let team = saved(" Acme ", " ACME ", " Boss@Acme.COM");
        assert_eq!(team.id.len(), 26);
        assert_eq!(team.name, "Acme");
        assert_eq!(team.url_id, "acme");
        assert_eq!(team.email, "boss@acme.com");
        assert_eq!(team.create_at, team.update_at);
        assert!(team.is_valid().is_ok());
    }

    #[test]
    fn test_invalid_fields() {
        let cases = [
            (saved("", "acme", "a@b.com"), "name"),
            (saved("Acme", "api", "a@b.com"), "url_id"),
            (saved("Acme", "ac", "a@b.com"), "url_id"),
            (saved("Acme", "acme", "not-an-email"), "email"),
        ];

        for (team, field) in cases {
            assert_eq!(team.is_valid(), Err(InvalidField::new("team", field)));
        }

        assert_eq!(
            Team::new("Acme", "acme", "a@b.com").is_valid(),
            Err(InvalidField::new("team", "id"))
        );
    }

    #[test]
    fn test_is_valid_for_create_does_not_mutate() {
        let team = Team::new("Acme", "acme", "a@b.com");
        assert!(team.is_valid_for_create().is_ok());
        assert!(team.id.is_empty());
    }

    #[test]
    fn test_etag_tracks_updates() {
        let mut team = saved("Acme", "acme", "a@b.com");
        let before = team.etag();
        team.update_at += 1;
        assert_ne!(before, team.etag());
    }

    #[test]
    fn test_serde_shape() {
        let team: Team =
            serde_json::from_str(r#"{"name":"Acme","url_id":"acme","email":"a@b.com","type":"I"}"#)
                .unwrap();
        assert_eq!(team.team_type, TeamType::Invite);
        assert!(!team.allow_assistant);
        assert!(team.id.is_empty());
    }
}
