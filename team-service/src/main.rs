use std::env;
use std::sync::Arc;

use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use team_service::{
    config::TeamConfig,
    dtos::SignupTeamRequest,
    services::SmtpMailer,
    store::MemoryStore,
    token::{InviteFlow, SignedLinkQuery},
    AppState,
};

const USAGE: &str = "usage: team-service signup <email> <team name> | check-link <create|join> <query>";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = TeamConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        service = %config.service_name,
        version = %env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting team service"
    );

    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let state = AppState::new(config, Arc::new(MemoryStore::new()), mailer);

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [command, email, name] if command == "signup" => {
            let response = state
                .teams
                .signup_team(SignupTeamRequest {
                    email: email.clone(),
                    name: name.clone(),
                })
                .await?;
            tracing::info!(email = %response.email, team = %response.name, "Signup link sent");
            if let Some(link) = response.follow_link {
                println!("{}", link);
            }
        }
        [command, flow, query] if command == "check-link" => {
            let flow = match flow.as_str() {
                "create" => InviteFlow::CreateTeam,
                "join" => InviteFlow::JoinTeam,
                _ => return Err(AppError::InvalidParam("flow".to_string())),
            };
            let query = SignedLinkQuery::parse(query)?;
            let context = state
                .teams
                .tokens()
                .validate(flow, &query.payload, &query.tag)?;
            tracing::info!(email = %context.email(), flow = ?context.flow(), "Link is valid");
        }
        _ => {
            eprintln!("{}", USAGE);
            return Err(AppError::InvalidParam("command".to_string()));
        }
    }

    Ok(())
}
