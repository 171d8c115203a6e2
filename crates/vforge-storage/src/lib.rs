//! S3-compatible durable storage client (Cloudflare R2).
//!
//! This crate provides:
//! - Byte and file upload under job-scoped keys
//! - Public URL construction for uploaded objects
//! - Object deletion (manual recovery tooling)

pub mod client;
pub mod error;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
