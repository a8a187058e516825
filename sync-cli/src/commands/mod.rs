//! CLI command implementations.

pub mod connect;
pub mod init;
pub mod serve;
pub mod status;
