use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use service_core::utils::signature::{generate_signature, verify_signature};

use super::codec::{self, Props};
use super::TokenError;

/// How long an issued link is accepted. Fixed by the protocol.
pub const VALIDITY_WINDOW_MILLIS: i64 = 60 * 60 * 1000;

const EMAIL_KEY: &str = "email";
const TIME_KEY: &str = "time";
const NAME_KEY: &str = "name";
const TEAM_ID_KEY: &str = "id";
const URL_ID_KEY: &str = "urlId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteFlow {
    CreateTeam,
    JoinTeam,
}

impl InviteFlow {
    /// Path segment of the page that redeems links for this flow.
    pub fn completion_path(&self) -> &'static str {
        match self {
            InviteFlow::CreateTeam => "signup_team_complete",
            InviteFlow::JoinTeam => "signup_user_complete",
        }
    }
}

/// What a link vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteContext {
    CreateTeam {
        email: String,
        name: String,
    },
    JoinTeam {
        email: String,
        team_id: String,
        team_name: String,
        url_id: String,
    },
}

impl InviteContext {
    pub fn create_team(email: impl Into<String>, name: impl Into<String>) -> Self {
        InviteContext::CreateTeam {
            email: email.into(),
            name: name.into(),
        }
    }

    pub fn join_team(
        email: impl Into<String>,
        team_id: impl Into<String>,
        team_name: impl Into<String>,
        url_id: impl Into<String>,
    ) -> Self {
        InviteContext::JoinTeam {
            email: email.into(),
            team_id: team_id.into(),
            team_name: team_name.into(),
            url_id: url_id.into(),
        }
    }

    pub fn flow(&self) -> InviteFlow {
        match self {
            InviteContext::CreateTeam { .. } => InviteFlow::CreateTeam,
            InviteContext::JoinTeam { .. } => InviteFlow::JoinTeam,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            InviteContext::CreateTeam { email, .. } | InviteContext::JoinTeam { email, .. } => {
                email
            }
        }
    }

    fn into_props(self, issued_at: i64) -> Result<Props, TokenError> {
        let mut props = Props::new();

        let email = self.email().trim().to_lowercase();
        if email.is_empty() {
            return Err(TokenError::MissingField(EMAIL_KEY));
        }
        props.insert(EMAIL_KEY.to_string(), email);
        props.insert(TIME_KEY.to_string(), issued_at.to_string());

        match self {
            InviteContext::CreateTeam { name, .. } => {
                props.insert(NAME_KEY.to_string(), required(NAME_KEY, name.trim())?);
            }
            InviteContext::JoinTeam {
                team_id,
                team_name,
                url_id,
                ..
            } => {
                props.insert(TEAM_ID_KEY.to_string(), required(TEAM_ID_KEY, &team_id)?);
                props.insert(NAME_KEY.to_string(), required(NAME_KEY, &team_name)?);
                props.insert(URL_ID_KEY.to_string(), required(URL_ID_KEY, &url_id)?);
            }
        }

        Ok(props)
    }

    fn from_props(flow: InviteFlow, props: &Props) -> Result<Self, TokenError> {
        let field = |key: &'static str| {
            props
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(TokenError::InvalidPayload(key))
        };

        let email = field(EMAIL_KEY)?;
        match flow {
            // A join link must not double as a team creation link.
            InviteFlow::CreateTeam if props.contains_key(TEAM_ID_KEY) => {
                Err(TokenError::InvalidPayload(TEAM_ID_KEY))
            }
            InviteFlow::CreateTeam => Ok(InviteContext::CreateTeam {
                email,
                name: field(NAME_KEY)?,
            }),
            InviteFlow::JoinTeam => Ok(InviteContext::JoinTeam {
                email,
                team_id: field(TEAM_ID_KEY)?,
                team_name: field(NAME_KEY)?,
                url_id: field(URL_ID_KEY)?,
            }),
        }
    }
}

fn required(key: &'static str, value: &str) -> Result<String, TokenError> {
    if value.is_empty() {
        Err(TokenError::MissingField(key))
    } else {
        Ok(value.to_string())
    }
}

/// Output of [`InviteTokens::issue`]: what goes into the emailed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub flow: InviteFlow,
    pub payload: String,
    pub tag: String,
    pub issued_at: i64,
}

impl IssuedToken {
    pub fn valid_for(&self) -> Duration {
        Duration::milliseconds(VALIDITY_WINDOW_MILLIS)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.issued_at + VALIDITY_WINDOW_MILLIS)
            .single()
    }

    /// `<base>/<completion-path>/?d=<payload>&h=<tag>`, both parameters URL-escaped.
    pub fn link(&self, base_url: &str) -> String {
        format!(
            "{}/{}/?d={}&h={}",
            base_url.trim_end_matches('/'),
            self.flow.completion_path(),
            urlencoding::encode(&self.payload),
            urlencoding::encode(&self.tag)
        )
    }
}

/// The two query parameters a completion page receives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignedLinkQuery {
    #[serde(rename = "d")]
    pub payload: String,
    #[serde(rename = "h")]
    pub tag: String,
}

impl SignedLinkQuery {
    pub fn parse(query: &str) -> Result<Self, TokenError> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| TokenError::MalformedPayload(e.to_string()))
    }
}

/// Issues and validates links with a process-wide signing secret.
#[derive(Clone)]
pub struct InviteTokens {
    secret: SecretString,
}

impl InviteTokens {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    pub fn issue(&self, context: InviteContext) -> Result<IssuedToken, TokenError> {
        self.issue_at(context, Utc::now().timestamp_millis())
    }

    pub fn issue_at(
        &self,
        context: InviteContext,
        now_millis: i64,
    ) -> Result<IssuedToken, TokenError> {
        let flow = context.flow();
        let payload = codec::encode(&context.into_props(now_millis)?);
        let tag = generate_signature(self.secret.expose_secret(), &payload)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            flow,
            payload,
            tag,
            issued_at: now_millis,
        })
    }

    pub fn validate(
        &self,
        flow: InviteFlow,
        payload: &str,
        tag: &str,
    ) -> Result<InviteContext, TokenError> {
        self.validate_at(flow, payload, tag, Utc::now().timestamp_millis())
    }

    /// Checks run in a fixed order and stop at the first failure: signature,
    /// payload shape, freshness. Nothing about the payload is inspected before
    /// the signature is known to be good.
    pub fn validate_at(
        &self,
        flow: InviteFlow,
        payload: &str,
        tag: &str,
        now_millis: i64,
    ) -> Result<InviteContext, TokenError> {
        let authentic = verify_signature(self.secret.expose_secret(), payload, tag)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        if !authentic {
            return Err(TokenError::InvalidSignature);
        }

        let props = codec::decode(payload)?;
        let issued_at: i64 = props
            .get(TIME_KEY)
            .and_then(|t| t.parse().ok())
            .ok_or(TokenError::InvalidPayload(TIME_KEY))?;

        if now_millis.saturating_sub(issued_at) > VALIDITY_WINDOW_MILLIS {
            return Err(TokenError::Expired);
        }

        InviteContext::from_props(flow, &props)
    }
}

impl std::fmt::Debug for InviteTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteTokens").finish_non_exhaustive()
    }
}
