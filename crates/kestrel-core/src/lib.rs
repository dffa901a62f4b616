//! Core types, configuration, and error handling for the Kestrel platform.
//!
//! This crate provides the shared foundation used by all other Kestrel crates:
//! - [`KestrelError`] — unified error type using `thiserror`
//! - [`KestrelConfig`] — configuration loaded from `.kestrel.toml`
//! - Shared types: [`PrFile`], [`ReviewFinding`], [`FileReview`], [`RoleId`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{CompletionConfig, KestrelConfig, ReviewConfig, VectorConfig};
pub use error::KestrelError;
pub use types::{FileReview, OutputFormat, PrFile, ReviewFinding, RoleId};

/// A convenience `Result` type for Kestrel operations.
pub type Result<T> = std::result::Result<T, KestrelError>;
