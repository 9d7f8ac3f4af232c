/// Hardware keyword detector library
///
/// Arms the keyword-detection engine of a hardware voice endpoint through the
/// audio device manager, waits for a detection within a timeout, and releases
/// the hardware path afterwards.

pub mod clock;
pub mod config;
pub mod detector;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod service;
pub mod sim;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DetectorConfig, StreamFormat, DEFAULT_SAMPLE_RATE};
pub use detector::{DetectionOutcome, HardwareKeywordDetector};
pub use endpoint::Endpoint;
pub use error::DetectorError;
pub use manager::{AudioDeviceManager, ManagerError, MessageId, ProcessType, SpeechDetectMode};
pub use registry::{EndpointLease, EndpointRegistry};
pub use service::{KeywordEvent, KeywordService, ServiceStats};
pub use sim::{CallKind, ManagerCall, SimulatedAudioManager, DEFAULT_CALL_LOG_CAPACITY};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
