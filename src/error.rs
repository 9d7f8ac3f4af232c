/// Error taxonomy for the keyword detector

use crate::endpoint::Endpoint;
use crate::manager::ManagerError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("speech detector registration failed for {endpoint}")]
    RegistrationFailed {
        endpoint: Endpoint,
        #[source]
        source: ManagerError,
    },

    #[error("speech detector handler registration failed for {endpoint}")]
    HandlerRegistrationFailed {
        endpoint: Endpoint,
        #[source]
        source: ManagerError,
    },

    #[error("unregistering process failed for {endpoint}")]
    UnregistrationFailed {
        endpoint: Endpoint,
        #[source]
        source: ManagerError,
    },

    #[error("starting keyword detection failed for {endpoint}")]
    StartFailed {
        endpoint: Endpoint,
        #[source]
        source: ManagerError,
    },

    #[error("{0} does not support keyword detection")]
    DeviceUnsupported(Endpoint),

    #[error("no keyword detected on {endpoint} within {timeout:?}")]
    TimedOut { endpoint: Endpoint, timeout: Duration },

    #[error("detector for {0} is not initialized")]
    NotInitialized(Endpoint),

    #[error("{0} is already owned by another detector")]
    EndpointBusy(Endpoint),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Detection worker failed: {0}")]
    Worker(String),
}
