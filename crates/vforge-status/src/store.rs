//! Job snapshot persistence.

use redis::AsyncCommands;
use tracing::debug;

use vforge_models::{Job, JobId};

use crate::error::{StatusError, StatusResult};

/// How long a job snapshot lives after its last update.
pub const JOB_STATUS_TTL_SECS: u64 = 24 * 60 * 60;

/// Redis-backed store of job status snapshots.
#[derive(Clone)]
pub struct RedisStatusStore {
    client: redis::Client,
}

impl RedisStatusStore {
    /// Create a new store from a Redis URL.
    pub fn new(redis_url: &str) -> StatusResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Create from the `REDIS_URL` environment variable.
    pub fn from_env() -> StatusResult<Self> {
        let url = std::env::var("REDIS_URL")
            .map_err(|_| StatusError::config("REDIS_URL not set"))?;
        Self::new(&url)
    }

    /// Key holding the snapshot for a job.
    pub fn key(job_id: &JobId) -> String {
        format!("job:{}", job_id)
    }

    /// Overwrite the stored snapshot with the current job record.
    pub async fn write_snapshot(&self, job: &Job) -> StatusResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(job)?;
        let key = Self::key(&job.id);

        debug!(job_id = %job.id, status = %job.status, seq = job.event_seq, "Writing job snapshot");
        conn.set_ex::<_, _, ()>(key, payload, JOB_STATUS_TTL_SECS).await?;
        Ok(())
    }

    /// Read the latest snapshot for a job, if any.
    pub async fn read_snapshot(&self, job_id: &JobId) -> StatusResult<Option<Job>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::key(job_id)).await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
