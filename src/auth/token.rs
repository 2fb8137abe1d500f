//! Bearer secret handling and exchanged downstream credentials.

pub mod credential;
pub mod secret;
