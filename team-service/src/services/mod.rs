//! Collaborators of the team flows: outgoing mail and post-creation
//! provisioning.

mod email;
pub mod notices;
mod provisioning;

pub use email::{Mailer, MockMailer, SentMail, SmtpMailer};
pub use notices::Notice;
pub use provisioning::{
    Provisioner, ProvisioningFailure, ProvisioningStep, ASSISTANT_USERNAME, DEFAULT_CHANNELS,
};
