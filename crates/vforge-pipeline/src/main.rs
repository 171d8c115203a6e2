//! Long-form video generation pipeline binary.
//!
//! Reads one job request (JSON) from the path given as the first argument
//! and runs it to a terminal state.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vforge_pipeline::{
    FfmpegContinuityExtractor, FfmpegStitcher, GeneratorConfig, HttpFetcher,
    HttpGenerationClient, HttpPlanningClient, JobOrchestrator, JobRequest, KeyframeProvider,
    PipelineConfig, RedisProgressReporter, SegmentGenerator, ShotPlanner,
};
use vforge_status::RedisStatusStore;
use vforge_storage::R2Client;

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vforge=info".parse().unwrap())
        .add_directive("aws_config=warn".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vforge-pipeline");

    if let Err(e) = vforge_media::check_ffmpeg() {
        error!("FFmpeg unavailable: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = vforge_media::check_ffprobe() {
        error!("FFprobe unavailable: {}", e);
        std::process::exit(1);
    }

    let request_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            error!("Usage: vforge-pipeline <request.json>");
            std::process::exit(2);
        }
    };
    let request: JobRequest = match std::fs::read_to_string(&request_path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
    {
        Ok(request) => request,
        Err(e) => {
            error!("Invalid job request {}: {}", request_path, e);
            std::process::exit(2);
        }
    };

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let orchestrator = match build_orchestrator(&config) {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to build pipeline: {}", e);
            std::process::exit(1);
        }
    };

    let job = orchestrator.run(request).await;

    match job.result_url {
        Some(url) => {
            info!(job_id = %job.id, "Job done: {}", url);
        }
        None => {
            error!(
                job_id = %job.id,
                "Job failed: {}",
                job.error_message.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
    }
}

fn build_orchestrator(config: &PipelineConfig) -> Result<JobOrchestrator, String> {
    let planning = HttpPlanningClient::from_env().map_err(|e| e.to_string())?;
    let generation: Arc<HttpGenerationClient> =
        Arc::new(HttpGenerationClient::from_env().map_err(|e| e.to_string())?);
    let fetcher: Arc<HttpFetcher> =
        Arc::new(HttpFetcher::new(config.http_timeout).map_err(|e| e.to_string())?);
    let store: Arc<R2Client> = Arc::new(R2Client::from_env().map_err(|e| e.to_string())?);

    let status_store = RedisStatusStore::from_env().map_err(|e| e.to_string())?;
    let reporter = Arc::new(RedisProgressReporter::new(status_store));

    let continuity = Arc::new(FfmpegContinuityExtractor::new(
        fetcher.clone(),
        config.work_dir.clone(),
    ));
    let stitcher = Arc::new(FfmpegStitcher::new(
        fetcher.clone(),
        store.clone(),
        config.work_dir.clone(),
    ));

    let generator_config = GeneratorConfig {
        retry_backoff: config.retry_backoff,
        poll_interval: config.poll_interval,
        poll_max_attempts: config.poll_max_attempts,
        ..GeneratorConfig::default()
    };

    Ok(JobOrchestrator::new(
        ShotPlanner::new(Arc::new(planning), config.heuristic_shot_seconds),
        KeyframeProvider::new(
            generation.clone(),
            fetcher.clone(),
            continuity.clone(),
            config.seed_clip_seconds,
            config.poll_interval,
            config.poll_max_attempts,
        ),
        SegmentGenerator::new(generation, store, fetcher, generator_config),
        continuity,
        stitcher,
        reporter,
    ))
}
