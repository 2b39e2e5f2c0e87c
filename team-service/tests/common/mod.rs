#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use team_service::{
    config::TeamConfig,
    dtos::{NewTeam, NewUser, TeamSignup},
    handlers::{RequestContext, Session},
    models::{Channel, Team, User, ROLE_ADMIN},
    services::MockMailer,
    store::{MemoryStore, StoreBackend, StoreError, StoreResult},
    token::SignedLinkQuery,
    AppState,
};

pub const SITE_URL: &str = "https://chat.example.com";
pub const SECRET: &str = "integration-test-invite-secret-0123456789";

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn test_config(dev: bool, allow_assistant: bool) -> TeamConfig {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("ENVIRONMENT", if dev { "dev" } else { "prod" }.to_string()),
        ("SERVICE_NAME", "team-service-test".to_string()),
        ("LOG_LEVEL", "debug".to_string()),
        ("SITE_NAME", "Example Chat".to_string()),
        ("SITE_URL", SITE_URL.to_string()),
        ("INVITE_SALT", SECRET.to_string()),
        ("ALLOW_ASSISTANT_DEFAULT", allow_assistant.to_string()),
        ("SMTP_HOST", "smtp.example.com".to_string()),
        ("SMTP_USER", "mailer".to_string()),
        ("SMTP_PASSWORD", "pw".to_string()),
        ("SMTP_FROM", "noreply@example.com".to_string()),
    ]);
    vars.insert("ASSISTANT_EMAIL", "assistant@example.com".to_string());

    TeamConfig::from_lookup(Default::default(), |key| vars.get(key).cloned())
        .expect("test config must load")
}

/// [`MemoryStore`] wrapper that can fail chosen operations, delay
/// `get_user_by_id`, and records which operations ran to completion.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Mutex<HashSet<&'static str>>,
    slow_user_lookup: Mutex<Option<Duration>>,
    completed: Mutex<Vec<&'static str>>,
}

impl FlakyStore {
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn slow_user_lookup(&self, delay: Duration) {
        *self.slow_user_lookup.lock().unwrap() = Some(delay);
    }

    pub fn completed(&self, op: &str) -> usize {
        self.completed
            .lock()
            .unwrap()
            .iter()
            .filter(|done| **done == op)
            .count()
    }

    fn check(&self, op: &'static str) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(op) {
            Err(StoreError::Unavailable(format!("{} failed on purpose", op)))
        } else {
            Ok(())
        }
    }

    fn done<T>(&self, op: &'static str, result: StoreResult<T>) -> StoreResult<T> {
        self.completed.lock().unwrap().push(op);
        result
    }
}

#[async_trait]
impl StoreBackend for FlakyStore {
    async fn get_team_by_id(&self, id: &str) -> StoreResult<Team> {
        self.check("get_team_by_id")?;
        let result = self.inner.get_team_by_id(id).await;
        self.done("get_team_by_id", result)
    }

    async fn get_team_by_url_id(&self, url_id: &str) -> StoreResult<Team> {
        self.check("get_team_by_url_id")?;
        let result = self.inner.get_team_by_url_id(url_id).await;
        self.done("get_team_by_url_id", result)
    }

    async fn get_teams_by_email(&self, email: &str) -> StoreResult<Vec<Team>> {
        self.check("get_teams_by_email")?;
        let result = self.inner.get_teams_by_email(email).await;
        self.done("get_teams_by_email", result)
    }

    async fn save_team(&self, team: Team) -> StoreResult<Team> {
        self.check("save_team")?;
        let result = self.inner.save_team(team).await;
        self.done("save_team", result)
    }

    async fn update_team(&self, team: Team) -> StoreResult<Team> {
        self.check("update_team")?;
        let result = self.inner.update_team(team).await;
        self.done("update_team", result)
    }

    async fn update_team_name(&self, name: &str, team_id: &str) -> StoreResult<()> {
        self.check("update_team_name")?;
        let result = self.inner.update_team_name(name, team_id).await;
        self.done("update_team_name", result)
    }

    async fn get_user_by_id(&self, id: &str) -> StoreResult<User> {
        self.check("get_user_by_id")?;
        let delay = *self.slow_user_lookup.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.inner.get_user_by_id(id).await;
        self.done("get_user_by_id", result)
    }

    async fn get_user_by_email(&self, team_id: &str, email: &str) -> StoreResult<User> {
        self.check("get_user_by_email")?;
        let result = self.inner.get_user_by_email(team_id, email).await;
        self.done("get_user_by_email", result)
    }

    async fn save_user(&self, user: User) -> StoreResult<User> {
        self.check("save_user")?;
        let result = self.inner.save_user(user).await;
        self.done("save_user", result)
    }

    async fn save_channel(&self, channel: Channel) -> StoreResult<Channel> {
        self.check("save_channel")?;
        let result = self.inner.save_channel(channel).await;
        self.done("save_channel", result)
    }

    async fn get_channels_by_team(&self, team_id: &str) -> StoreResult<Vec<Channel>> {
        self.check("get_channels_by_team")?;
        let result = self.inner.get_channels_by_team(team_id).await;
        self.done("get_channels_by_team", result)
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<FlakyStore>,
    pub mailer: Arc<MockMailer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config(true, false))
    }

    pub fn with_config(config: TeamConfig) -> Self {
        init_logging();
        let store = Arc::new(FlakyStore::default());
        let mailer = Arc::new(MockMailer::new());
        let state = AppState::new(config, store.clone(), mailer.clone());
        Self {
            state,
            store,
            mailer,
        }
    }

    /// A saved team with an admin account, plus a session for that admin.
    pub async fn team_with_admin(&self, url_id: &str) -> (Team, User, RequestContext) {
        let team = self
            .state
            .store
            .save_team(Team::new("Acme", url_id, "boss@acme.com"))
            .await
            .unwrap();

        let mut admin = User::new(team.id.clone(), "boss", "boss@acme.com");
        admin.full_name = "Big Boss".to_string();
        admin.roles = ROLE_ADMIN.to_string();
        let admin = self.state.store.save_user(admin).await.unwrap();

        let ctx = RequestContext::new(
            Session::new(admin.id.clone(), team.id.clone(), admin.roles.clone()),
            SITE_URL,
        );
        (team, admin, ctx)
    }
}

/// The signed link in the last mail sent to `to`, as query parameters.
pub fn link_sent_to(mailer: &MockMailer, to: &str) -> SignedLinkQuery {
    let mail = mailer
        .sent_to(to)
        .pop()
        .unwrap_or_else(|| panic!("no mail sent to {}", to));
    let link = mail
        .body
        .lines()
        .find(|line| line.contains("?d="))
        .expect("mail carries a link");
    let query = &link[link.find('?').unwrap()..];
    SignedLinkQuery::parse(query).unwrap()
}

pub fn team_signup(query: &SignedLinkQuery, url_id: &str, invites: &[&str]) -> TeamSignup {
    TeamSignup {
        team: NewTeam {
            name: "Acme".to_string(),
            url_id: url_id.to_string(),
            company_name: String::new(),
        },
        user: NewUser {
            username: "boss".to_string(),
            full_name: "Big Boss".to_string(),
            password: "correct horse".to_string(),
        },
        invites: invites.iter().map(|s| s.to_string()).collect(),
        data: query.payload.clone(),
        hash: query.tag.clone(),
    }
}
