pub mod context;
pub mod teams;

pub use context::{sender_status, RequestContext, Session};
pub use teams::TeamHandlers;
