//! REST client for the backstop backup service
//!
//! Exposes the [`BackupApi`] trait, its HTTPS implementation [`ApiClient`],
//! and the camelCase wire types. With the `test-utils` feature an in-memory
//! `MockApi` is available for tests of dependent crates.

pub mod client;
pub mod error;
#[cfg(feature = "test-utils")]
pub mod mock;
pub mod token;
pub mod types;

pub use client::{ApiClient, BackupApi};
pub use error::{ApiError, Result};
#[cfg(feature = "test-utils")]
pub use mock::{MockApi, RecordedRestore};
pub use token::TokenCache;
pub use types::*;
