pub mod config;
pub mod core;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod resilience;
pub mod server;
pub mod session;
pub mod sources;

pub use error::{LiveError, LiveResult};
