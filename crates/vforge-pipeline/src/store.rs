//! Durable storage seam over the R2 client.

use async_trait::async_trait;

use vforge_storage::R2Client;

use crate::error::PipelineResult;
use crate::traits::DurableStore;

#[async_trait]
impl DurableStore for R2Client {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> PipelineResult<String> {
        Ok(self.put_bytes(key, bytes, content_type).await?)
    }
}
