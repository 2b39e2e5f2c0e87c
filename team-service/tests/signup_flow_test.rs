mod common;

use common::{link_sent_to, team_signup, test_config, Harness, SITE_URL};
use service_core::error::AppError;
use team_service::{
    dtos::SignupTeamRequest,
    models::ROLE_ADMIN,
    services::DEFAULT_CHANNELS,
    token::{InviteContext, VALIDITY_WINDOW_MILLIS},
    utils::{verify_password, Password},
};
use tokio_test::assert_ok;

fn signup_request(email: &str) -> SignupTeamRequest {
    SignupTeamRequest {
        email: email.to_string(),
        name: " Acme ".to_string(),
    }
}

#[tokio::test]
async fn test_signup_then_create_team() {
    let harness = Harness::new();

    let response = harness
        .state
        .teams
        .signup_team(signup_request(" Boss@Acme.com "))
        .await
        .unwrap();
    assert_eq!(response.email, "boss@acme.com");
    assert_eq!(response.name, "Acme");

    let follow_link = response.follow_link.expect("dev mode echoes the link");
    assert!(follow_link.starts_with(&format!("{}/signup_team_complete/?d=", SITE_URL)));

    let query = link_sent_to(&harness.mailer, "boss@acme.com");
    let outcome = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "acme", &[]))
        .await
        .unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.team.url_id, "acme");
    assert_eq!(outcome.team.email, "boss@acme.com");

    let user = outcome.user.expect("first account");
    assert_eq!(user.team_id, outcome.team.id);
    assert_eq!(user.email, "boss@acme.com");
    assert!(user.email_verified);
    assert!(user.has_role(ROLE_ADMIN));
    assert!(verify_password(&Password::new("correct horse"), &user.password_hash));

    let channels = harness
        .state
        .store
        .get_channels_by_team(outcome.team.id.clone())
        .await
        .unwrap();
    assert_eq!(channels.len(), DEFAULT_CHANNELS.len());

    // Default assistant provisioning is off in this configuration.
    assert!(!outcome.team.allow_assistant);
}

#[tokio::test]
async fn test_signup_link_reusable_within_window_but_url_is_taken() {
    let harness = Harness::new();
    harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap();
    let query = link_sent_to(&harness.mailer, "boss@acme.com");

    assert_ok!(
        harness
            .state
            .teams
            .create_team_from_signup(team_signup(&query, "acme", &[]))
            .await
    );

    let err = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "acme", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // No replay protection: the same link still creates a second team.
    assert_ok!(
        harness
            .state
            .teams
            .create_team_from_signup(team_signup(&query, "acme-two", &[]))
            .await
    );
}

#[tokio::test]
async fn test_expired_link_creates_nothing() {
    let harness = Harness::new();
    let issued_at = chrono::Utc::now().timestamp_millis() - VALIDITY_WINDOW_MILLIS - 60_000;
    let issued = harness
        .state
        .teams
        .tokens()
        .issue_at(InviteContext::create_team("boss@acme.com", "Acme"), issued_at)
        .unwrap();
    let query = team_service::token::SignedLinkQuery {
        payload: issued.payload,
        tag: issued.tag,
    };

    let err = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "acme", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidLink(_)));
    assert_eq!(harness.store.completed("save_team"), 0);
    assert!(!harness.state.teams.find_team_by_url_id("acme").await.unwrap());
}

#[tokio::test]
async fn test_forged_tag_creates_nothing() {
    let harness = Harness::new();
    harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap();
    let mut query = link_sent_to(&harness.mailer, "boss@acme.com");

    let last = query.tag.pop().unwrap();
    query.tag.push(if last == '0' { '1' } else { '0' });

    let err = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "acme", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidLink(_)));
    assert_eq!(harness.store.completed("get_team_by_url_id"), 0);
    assert_eq!(harness.store.completed("save_team"), 0);
}

#[tokio::test]
async fn test_tampered_payload_is_rejected() {
    let harness = Harness::new();
    harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap();
    let mut query = link_sent_to(&harness.mailer, "boss@acme.com");
    query.payload = query.payload.replace("boss@acme.com", "evil@acme.com");

    let err = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "acme", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidLink(_)));
}

#[tokio::test]
async fn test_signup_invites_listed_members() {
    let harness = Harness::new();
    harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap();
    let query = link_sent_to(&harness.mailer, "boss@acme.com");

    let outcome = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "acme", &["Alice@Acme.com", ""]))
        .await
        .unwrap();

    let invite = link_sent_to(&harness.mailer, "alice@acme.com");
    let details = harness
        .state
        .teams
        .complete_user_signup(&invite.payload, &invite.tag)
        .await
        .unwrap();
    assert_eq!(details.team_id, outcome.team.id);
    assert_eq!(details.email, "alice@acme.com");

    let mail = harness.mailer.sent_to("alice@acme.com").pop().unwrap();
    assert!(mail.subject.contains("Big Boss"));
    assert!(mail.body.contains("administrator"));
}

#[tokio::test]
async fn test_signup_invalid_input() {
    let harness = Harness::new();

    let err = harness
        .state
        .teams
        .signup_team(signup_request("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidParam(_)));

    let err = harness
        .state
        .teams
        .signup_team(SignupTeamRequest {
            email: "boss@acme.com".to_string(),
            name: "  ".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidParam(_)));
    assert!(harness.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_signup_mail_failure_fails_request() {
    let harness = Harness::new();
    harness.mailer.fail_for("boss@acme.com");

    let err = harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailError(_)));
}

#[tokio::test]
async fn test_prod_mode_hides_follow_link() {
    let harness = Harness::with_config(test_config(false, false));

    let response = harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap();
    assert!(response.follow_link.is_none());
    assert_eq!(harness.mailer.sent_to("boss@acme.com").len(), 1);
}

#[tokio::test]
async fn test_reserved_url_is_rejected_before_save() {
    let harness = Harness::new();
    harness
        .state
        .teams
        .signup_team(signup_request("boss@acme.com"))
        .await
        .unwrap();
    let query = link_sent_to(&harness.mailer, "boss@acme.com");

    let err = harness
        .state
        .teams
        .create_team_from_signup(team_signup(&query, "admin", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidParam(_)));
    assert_eq!(harness.store.completed("save_team"), 0);
}
