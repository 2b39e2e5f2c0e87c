//! Signed, time-bounded signup and invitation links.
//!
//! A token is a canonical JSON payload plus an HMAC tag over it. Nothing is
//! persisted: a link stays valid for [`VALIDITY_WINDOW_MILLIS`] after issue and
//! can be redeemed any number of times within that window.

pub mod codec;
mod error;
mod protocol;

pub use codec::Props;
pub use error::TokenError;
pub use protocol::{
    InviteContext, InviteFlow, InviteTokens, IssuedToken, SignedLinkQuery, VALIDITY_WINDOW_MILLIS,
};
