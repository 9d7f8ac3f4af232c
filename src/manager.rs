/// Audio device manager interface
///
/// The adapter never touches hardware itself. Everything goes through an
/// `AudioDeviceManager`, which owns stream routing, the detection engine and
/// its own thread safety.

use crate::endpoint::Endpoint;
use std::fmt;
use thiserror::Error;

/// Status codes reported by the audio device manager
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerError {
    #[error("operation failed")]
    Failed,

    #[error("card not ready")]
    CardNotReady,

    #[error("invalid parameter")]
    InvalidParam,

    #[error("device does not support the requested process")]
    InvalidDevice,

    #[error("device failure")]
    DeviceFailed,

    #[error("no process registered for endpoint")]
    NotRegistered,
}

/// Processing role an input stream device can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessType {
    SpeechDetector,
}

/// Speech detector operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechDetectMode {
    /// Keyword detection
    KeywordDetect,

    /// End-of-speech detection
    EndPointDetect,
}

impl SpeechDetectMode {
    /// Handler message id the device posts when this mode fires
    pub fn message_id(self) -> MessageId {
        match self {
            SpeechDetectMode::KeywordDetect => MessageId(1),
            SpeechDetectMode::EndPointDetect => MessageId(2),
        }
    }
}

/// Identifier of a message posted to a process handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u16);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Operations the adapter needs from the audio subsystem
#[cfg_attr(test, mockall::automock)]
pub trait AudioDeviceManager: Send + Sync {
    /// Give the endpoint's input stream a processing role
    fn register_process_type(
        &self,
        endpoint: Endpoint,
        process: ProcessType,
        mode: SpeechDetectMode,
    ) -> Result<(), ManagerError>;

    /// Register the completion handler for a processing role
    fn register_process_handler(
        &self,
        endpoint: Endpoint,
        process: ProcessType,
    ) -> Result<(), ManagerError>;

    /// Drop whatever processing role the endpoint has
    fn unregister_process(&self, endpoint: Endpoint) -> Result<(), ManagerError>;

    fn start_process_type(
        &self,
        endpoint: Endpoint,
        mode: SpeechDetectMode,
    ) -> Result<(), ManagerError>;

    fn stop_process_type(
        &self,
        endpoint: Endpoint,
        mode: SpeechDetectMode,
    ) -> Result<(), ManagerError>;

    /// Take the next pending handler message, if any
    ///
    /// `Ok(None)` means nothing is pending. `Err(ManagerError::InvalidDevice)`
    /// means the endpoint cannot run the process at all.
    fn poll_handler_message(&self, endpoint: Endpoint) -> Result<Option<MessageId>, ManagerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_message_ids_are_distinct() {
        assert_ne!(
            SpeechDetectMode::KeywordDetect.message_id(),
            SpeechDetectMode::EndPointDetect.message_id()
        );
    }

    #[test]
    fn test_message_id_display() {
        assert_eq!(MessageId(1).to_string(), "0x0001");
    }
}
