use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("The signup/invite link does not appear to be valid")]
    InvalidSignature,

    #[error("Malformed token payload: {0}")]
    MalformedPayload(String),

    #[error("Token payload has a missing or invalid `{0}` field")]
    InvalidPayload(&'static str),

    #[error("The signup link has expired")]
    Expired,

    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature
            | TokenError::MalformedPayload(_)
            | TokenError::InvalidPayload(_)
            | TokenError::Expired => AppError::InvalidLink(anyhow::Error::new(err)),
            TokenError::MissingField(field) => AppError::InvalidParam(field.to_string()),
            TokenError::Signing(e) => AppError::InternalError(anyhow::anyhow!(e)),
        }
    }
}
