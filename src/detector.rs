/// Hardware keyword detector
///
/// Arms the speech-detector process of a hardware endpoint, polls the audio
/// manager for a keyword message until a deadline, and always disarms the
/// process afterwards.

use crate::clock::{Clock, SystemClock};
use crate::config::StreamFormat;
use crate::endpoint::Endpoint;
use crate::error::DetectorError;
use crate::manager::{AudioDeviceManager, ManagerError, ProcessType, SpeechDetectMode};
use crate::registry::{EndpointLease, EndpointRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const PROCESS: ProcessType = ProcessType::SpeechDetector;
const MODE: SpeechDetectMode = SpeechDetectMode::KeywordDetect;

/// Result of one detection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// A keyword message arrived before the deadline
    Detected,

    /// The deadline passed without a keyword message
    TimedOut,

    /// The device cannot run keyword detection
    Unsupported,
}

impl DetectionOutcome {
    pub fn is_detected(self) -> bool {
        matches!(self, DetectionOutcome::Detected)
    }

    /// Turn a non-detection into the matching error
    pub fn into_result(self, endpoint: Endpoint, timeout: Duration) -> Result<(), DetectorError> {
        match self {
            DetectionOutcome::Detected => Ok(()),
            DetectionOutcome::TimedOut => Err(DetectorError::TimedOut { endpoint, timeout }),
            DetectionOutcome::Unsupported => Err(DetectorError::DeviceUnsupported(endpoint)),
        }
    }
}

/// Keyword detector bound to one hardware endpoint
pub struct HardwareKeywordDetector {
    endpoint: Endpoint,
    manager: Arc<dyn AudioDeviceManager>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    registry: EndpointRegistry,
    lease: Option<EndpointLease>,
    format: Option<StreamFormat>,
}

impl HardwareKeywordDetector {
    /// Create a detector for `endpoint`. Nothing is checked or registered
    /// until [`initialize`](Self::initialize).
    pub fn new(endpoint: Endpoint, manager: Arc<dyn AudioDeviceManager>) -> Self {
        Self {
            endpoint,
            manager,
            clock: Arc::new(SystemClock),
            poll_interval: Duration::ZERO,
            registry: EndpointRegistry::global(),
            lease: None,
            format: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Pause between polls. Zero (the default) yields instead of sleeping.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn is_initialized(&self) -> bool {
        self.lease.is_some()
    }

    /// Format passed to the last successful `initialize`
    ///
    /// The hardware path runs at its native format, so this is recorded but
    /// not sent to the audio manager.
    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    /// Register the endpoint as a keyword-detecting speech detector
    ///
    /// On failure nothing stays registered and the endpoint is free again.
    pub fn initialize(&mut self, format: StreamFormat) -> Result<(), DetectorError> {
        let endpoint = self.endpoint;

        if self.is_initialized() {
            debug!("Detector for {} already initialized", endpoint);
            return Ok(());
        }

        format.validate()?;
        let lease = self.registry.claim(endpoint)?;

        self.manager
            .register_process_type(endpoint, PROCESS, MODE)
            .map_err(|source| {
                error!("register_process_type({}) failed: {}", endpoint, source);
                DetectorError::RegistrationFailed { endpoint, source }
            })?;

        if let Err(source) = self.manager.register_process_handler(endpoint, PROCESS) {
            error!("register_process_handler({}) failed: {}", endpoint, source);

            if let Err(e) = self.manager.unregister_process(endpoint) {
                warn!("Rolling back registration of {} failed: {}", endpoint, e);
            }

            return Err(DetectorError::HandlerRegistrationFailed { endpoint, source });
        }

        debug!(
            "Detector for {} initialized ({} Hz, {} ch)",
            endpoint, format.sample_rate, format.channels
        );

        self.lease = Some(lease);
        self.format = Some(format);
        Ok(())
    }

    /// Unregister the endpoint's process
    ///
    /// Best effort: a failure is logged, never returned. Calling this on a
    /// detector that is not initialized does nothing.
    pub fn deinitialize(&mut self) {
        let Some(lease) = self.lease.take() else {
            debug!("Detector for {} not initialized, nothing to release", self.endpoint);
            return;
        };

        if let Err(source) = self.manager.unregister_process(self.endpoint) {
            let err = DetectorError::UnregistrationFailed {
                endpoint: self.endpoint,
                source,
            };
            error!("{}: {}", err, source);
        } else {
            debug!("Detector for {} deinitialized", self.endpoint);
        }

        self.format = None;
        drop(lease);
    }

    /// Arm keyword detection and block until a keyword, the timeout, or an
    /// unsupported-device report
    ///
    /// Hardware detection is stopped again before returning whenever it was
    /// started. `Err` means detection never started.
    pub fn start_keyword_detect(
        &mut self,
        timeout: Duration,
    ) -> Result<DetectionOutcome, DetectorError> {
        let endpoint = self.endpoint;

        if !self.is_initialized() {
            return Err(DetectorError::NotInitialized(endpoint));
        }

        debug!("start_keyword_detect for {} (timeout {:?})", endpoint, timeout);

        self.manager
            .start_process_type(endpoint, MODE)
            .map_err(|source| {
                error!("start_process_type({}) failed: {}", endpoint, source);
                DetectorError::StartFailed { endpoint, source }
            })?;

        let outcome = self.poll_until(timeout);

        if let Err(e) = self.manager.stop_process_type(endpoint, MODE) {
            warn!("stop_process_type({}) failed: {}", endpoint, e);
        }

        Ok(outcome)
    }

    /// Like [`start_keyword_detect`](Self::start_keyword_detect), with
    /// timeouts and unsupported devices reported as errors
    pub fn wait_for_keyword(&mut self, timeout: Duration) -> Result<(), DetectorError> {
        self.start_keyword_detect(timeout)?
            .into_result(self.endpoint, timeout)
    }

    fn poll_until(&self, timeout: Duration) -> DetectionOutcome {
        let endpoint = self.endpoint;
        let keyword = MODE.message_id();
        // `None` only when the deadline is past what SystemTime can hold.
        let deadline = self.clock.now().checked_add(timeout);
        let mut polls: u64 = 0;

        loop {
            polls += 1;

            match self.manager.poll_handler_message(endpoint) {
                Ok(Some(id)) if id == keyword => {
                    info!("Keyword detected on {} after {} polls", endpoint, polls);
                    return DetectionOutcome::Detected;
                }
                Ok(Some(id)) => trace!("Ignoring message {} on {}", id, endpoint),
                Ok(None) => {}
                Err(ManagerError::InvalidDevice) => {
                    error!("{} does not support keyword detection", endpoint);
                    return DetectionOutcome::Unsupported;
                }
                Err(e) => trace!("Poll on {} returned {}", endpoint, e),
            }

            self.clock.idle(self.poll_interval);

            if deadline.is_some_and(|deadline| self.clock.now() > deadline) {
                debug!("No keyword on {} after {} polls", endpoint, polls);
                return DetectionOutcome::TimedOut;
            }
        }
    }
}

impl Drop for HardwareKeywordDetector {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.deinitialize();
        }
    }
}
