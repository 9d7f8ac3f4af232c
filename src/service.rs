/// Keyword listening service
///
/// Keeps a detector armed in a loop on a blocking worker and forwards each
/// detection as a [`KeywordEvent`]. Detection itself busy-polls, so it
/// never runs on the async executor threads.

use crate::detector::{DetectionOutcome, HardwareKeywordDetector};
use crate::endpoint::Endpoint;
use crate::error::DetectorError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A keyword detected by the service
#[derive(Debug, Clone)]
pub struct KeywordEvent {
    pub endpoint: Endpoint,

    /// Timestamp when the keyword was reported (microseconds since epoch)
    pub timestamp: i64,

    /// 1-based index of the detection attempt that fired
    pub attempt: u64,

    /// Time from arming the hardware to the detection
    pub latency: Duration,
}

/// Service statistics
#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    pub attempts: u64,
    pub detections: u64,
    pub timeouts: u64,
    pub is_running: bool,
}

pub struct KeywordService {
    endpoint: Endpoint,
    stop: Arc<AtomicBool>,
    stats: Arc<Mutex<ServiceStats>>,
    event_rx: mpsc::UnboundedReceiver<KeywordEvent>,
    worker: Option<JoinHandle<HardwareKeywordDetector>>,
}

impl KeywordService {
    /// Start listening with `timeout` per detection attempt
    ///
    /// Must be called inside a tokio runtime. The detector must already be
    /// initialized.
    pub fn spawn(
        detector: HardwareKeywordDetector,
        timeout: Duration,
    ) -> Result<Self, DetectorError> {
        let endpoint = detector.endpoint();

        if !detector.is_initialized() {
            return Err(DetectorError::NotInitialized(endpoint));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(ServiceStats {
            is_running: true,
            ..Default::default()
        }));

        let worker = {
            let stop = Arc::clone(&stop);
            let stats = Arc::clone(&stats);
            tokio::task::spawn_blocking(move || {
                let mut detector = detector;
                listen(&mut detector, timeout, &event_tx, &stop, &stats);
                detector
            })
        };

        info!("Keyword service started on {}", endpoint);

        Ok(Self {
            endpoint,
            stop,
            stats,
            event_rx,
            worker: Some(worker),
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Get the next keyword event (blocking)
    ///
    /// Returns `None` once the worker has exited.
    pub async fn recv_event(&mut self) -> Option<KeywordEvent> {
        self.event_rx.recv().await
    }

    /// Get the next keyword event (non-blocking)
    pub fn try_recv_event(&mut self) -> Option<KeywordEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats.lock().clone()
    }

    /// Stop listening and get the detector back
    ///
    /// Waits for the attempt in progress, so this can take up to one
    /// detection timeout.
    pub async fn shutdown(mut self) -> Result<HardwareKeywordDetector, DetectorError> {
        self.stop.store(true, Ordering::SeqCst);

        let worker = self
            .worker
            .take()
            .ok_or_else(|| DetectorError::Worker("worker already joined".to_string()))?;

        let detector = worker
            .await
            .map_err(|e| DetectorError::Worker(e.to_string()))?;

        info!("Keyword service on {} stopped", self.endpoint);
        Ok(detector)
    }
}

impl Drop for KeywordService {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn listen(
    detector: &mut HardwareKeywordDetector,
    timeout: Duration,
    event_tx: &mpsc::UnboundedSender<KeywordEvent>,
    stop: &AtomicBool,
    stats: &Mutex<ServiceStats>,
) {
    let endpoint = detector.endpoint();
    let mut attempt: u64 = 0;

    while !stop.load(Ordering::SeqCst) {
        attempt += 1;
        let armed_at = Instant::now();
        let result = detector.start_keyword_detect(timeout);
        stats.lock().attempts += 1;

        match result {
            Ok(DetectionOutcome::Detected) => {
                stats.lock().detections += 1;

                let event = KeywordEvent {
                    endpoint,
                    timestamp: current_timestamp_micros(),
                    attempt,
                    latency: armed_at.elapsed(),
                };

                if event_tx.send(event).is_err() {
                    debug!("Event channel closed, stopping listener on {}", endpoint);
                    break;
                }
            }
            Ok(DetectionOutcome::TimedOut) => {
                stats.lock().timeouts += 1;
            }
            Ok(DetectionOutcome::Unsupported) => {
                error!("Stopping listener: {} cannot detect keywords", endpoint);
                break;
            }
            Err(e) => {
                error!("Stopping listener: {}", e);
                break;
            }
        }
    }

    stats.lock().is_running = false;
}

fn current_timestamp_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or_default()
}
