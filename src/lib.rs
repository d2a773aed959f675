pub mod cli;
pub mod client;
pub mod commands;
pub mod credentials;
pub mod hydrate;
pub mod logging;
pub mod server;
pub mod setup;
pub mod status;
pub mod stream;
pub mod summary;

pub use client::{ClientError, ClientOptions, DatadogClient};
pub use credentials::Credential;
