//! Structured job logging utilities.

use tracing::{error, info};
use vforge_models::JobId;

/// Per-job logger with consistent structured fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    phase: String,
}

impl JobLogger {
    /// Create a logger for a job phase (e.g. "planning", "generating").
    pub fn new(job_id: &JobId, phase: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            phase: phase.to_string(),
        }
    }

    /// Log the start of a phase.
    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, phase = %self.phase, "Phase started: {}", message);
    }

    /// Log a fatal problem.
    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, phase = %self.phase, "Phase error: {}", message);
    }

    /// Log completion of a phase.
    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, phase = %self.phase, "Phase completed: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::new();
        let logger = JobLogger::new(&job_id, "stitching");
        assert_eq!(logger.job_id, job_id.to_string());
        assert_eq!(logger.phase, "stitching");
    }
}
