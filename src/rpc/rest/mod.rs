//! REST API for registry item resolution

pub mod items;
pub mod server;
pub mod status;
pub mod types;

pub use server::RestApiServer;
