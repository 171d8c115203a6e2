//! HTTP implementations of the planning, generation, and fetch seams.

pub mod fetch;
pub mod generation;
pub mod planning;

pub use fetch::HttpFetcher;
pub use generation::{GenerationClientConfig, HttpGenerationClient};
pub use planning::{HttpPlanningClient, PlanningClientConfig};
