//! # LyricMind Common Library
//!
//! Shared code for the LyricMind service and CLI:
//! - Error type shared by the cache stores and configuration
//! - Bootstrap configuration loading (TOML)
//! - Database initialization for the lyrics and analysis caches
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
