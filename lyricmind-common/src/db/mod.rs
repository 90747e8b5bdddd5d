//! Database initialization for the lyrics and analysis caches

pub mod init;

pub use init::*;
