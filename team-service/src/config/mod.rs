use secrecy::{ExposeSecret, SecretString};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Minimum signing secret length accepted in production.
pub const MIN_INVITE_SECRET_BYTES: usize = 32;

const DEV_INVITE_SECRET: &str = "dev-only-invite-secret-do-not-deploy-0000";

#[derive(Debug, Clone)]
pub struct TeamConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    /// Product name used in mail subjects.
    pub site_name: String,
    /// Base of every link put in outgoing mail, without a trailing slash.
    pub site_url: String,
    pub invite: InviteConfig,
    pub teams: TeamSettings,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct InviteConfig {
    pub secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct TeamSettings {
    pub allow_assistant_default: bool,
    pub assistant_email: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub from: String,
}

impl TeamConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_str = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;
        let var = |key: &str, default: Option<&str>| get_env(&lookup, key, default, is_prod);

        let log_level = var("LOG_LEVEL", Some(common.log_level.as_str()))?;

        let config = TeamConfig {
            common,
            log_level,
            environment: environment.clone(),
            service_name: var("SERVICE_NAME", Some("team-service"))?,
            site_name: var("SITE_NAME", Some("Chat"))?,
            site_url: var("SITE_URL", Some("http://localhost:8065"))?
                .trim_end_matches('/')
                .to_string(),
            invite: InviteConfig {
                secret: SecretString::new(var("INVITE_SALT", Some(DEV_INVITE_SECRET))?),
            },
            teams: TeamSettings {
                allow_assistant_default: var("ALLOW_ASSISTANT_DEFAULT", Some("false"))?
                    .parse()
                    .map_err(|e: std::str::ParseBoolError| {
                        AppError::ConfigError(anyhow::anyhow!(
                            "ALLOW_ASSISTANT_DEFAULT: {}",
                            e
                        ))
                    })?,
                assistant_email: lookup("ASSISTANT_EMAIL")
                    .unwrap_or_else(|| "assistant@localhost.localdomain".to_string()),
            },
            smtp: SmtpConfig {
                host: var("SMTP_HOST", Some("localhost"))?,
                port: lookup("SMTP_PORT")
                    .unwrap_or_else(|| "587".to_string())
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!("SMTP_PORT: {}", e))
                    })?,
                user: var("SMTP_USER", Some(""))?,
                password: SecretString::new(var("SMTP_PASSWORD", Some(""))?),
                from: var("SMTP_FROM", Some("Team Onboarding <noreply@localhost>"))?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.site_url.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SITE_URL must not be empty"
            )));
        }

        let secret = self.invite.secret.expose_secret();
        if secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "INVITE_SALT must not be empty"
            )));
        }

        if self.environment == Environment::Prod {
            if secret.len() < MIN_INVITE_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "INVITE_SALT must be at least {} bytes in production",
                    MIN_INVITE_SECRET_BYTES
                )));
            }
            if secret == DEV_INVITE_SECRET {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "INVITE_SALT is set to the development default"
                )));
            }
        }

        Ok(())
    }

    /// Dev mode allows creating teams without an emailed link and echoes
    /// signup links back to the caller.
    pub fn is_dev_mode(&self) -> bool {
        self.environment == Environment::Dev
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
