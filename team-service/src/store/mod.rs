//! Asynchronous data access.
//!
//! Handlers never talk to a persistence engine directly. Every operation on
//! [`StoreGateway`] starts immediately on the tokio runtime and hands back a
//! [`StoreFuture`] that resolves exactly once with the value or a
//! [`StoreError`]. Several futures can be in flight at once; each must be
//! awaited before its value is used.

mod backend;
mod error;
mod future;
mod gateway;
mod memory;

pub use backend::StoreBackend;
pub use error::{StoreError, StoreResult};
pub use future::StoreFuture;
pub use gateway::StoreGateway;
pub use memory::MemoryStore;
