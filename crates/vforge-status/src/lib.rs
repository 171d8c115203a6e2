//! Redis-backed job status store.
//!
//! Each update overwrites the whole job record as one JSON value, so a
//! poller reading concurrently always sees a complete snapshot, never a
//! partially applied diff.

pub mod error;
pub mod store;

pub use error::{StatusError, StatusResult};
pub use store::{RedisStatusStore, JOB_STATUS_TTL_SECS};
