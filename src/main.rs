/// Keyword detection service binary
///
/// Runs the listening loop against the simulated audio manager and logs
/// every detection until Ctrl-C.

use anyhow::Context;
use hw_keyword_detector::{
    logging, DetectorConfig, HardwareKeywordDetector, KeywordService, SimulatedAudioManager,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    info!("Starting keyword detection service v{}", hw_keyword_detector::VERSION);

    let config = load_config().context("failed to load configuration")?;
    info!("Endpoint: {}", config.endpoint());
    info!("Timeout: {}s, poll interval: {}ms", config.timeout_secs, config.poll_interval_ms);

    let sim = Arc::new(SimulatedAudioManager::new());
    let every: u64 = std::env::var("KD_SIM_DETECT_EVERY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50_000);
    sim.detect_every(every);

    let mut detector = HardwareKeywordDetector::new(config.endpoint(), sim)
        .with_poll_interval(config.poll_interval());
    detector
        .initialize(config.format())
        .context("failed to initialize detector")?;

    let mut service = KeywordService::spawn(detector, config.timeout())?;

    loop {
        tokio::select! {
            event = service.recv_event() => match event {
                Some(event) => info!(
                    "Keyword detected on {} (attempt {}, latency {:?}, timestamp {})",
                    event.endpoint, event.attempt, event.latency, event.timestamp
                ),
                None => {
                    warn!("Listener exited, shutting down");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    let stats = service.stats();
    let mut detector = service.shutdown().await?;
    detector.deinitialize();

    info!(
        "Keyword detection service stopped ({} attempts, {} detections, {} timeouts)",
        stats.attempts, stats.detections, stats.timeouts
    );
    Ok(())
}

/// Load configuration from `KD_CONFIG` (JSON file) or `KD_*` variables
fn load_config() -> Result<DetectorConfig, hw_keyword_detector::DetectorError> {
    match std::env::var("KD_CONFIG") {
        Ok(path) => DetectorConfig::from_json_file(path),
        Err(_) => DetectorConfig::from_env(),
    }
}
