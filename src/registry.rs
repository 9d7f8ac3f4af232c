/// Endpoint ownership registry
///
/// A card/device pair is a single piece of hardware. The registry hands out
/// at most one lease per endpoint; the lease gives the endpoint back when it
/// is dropped.

use crate::endpoint::Endpoint;
use crate::error::DetectorError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

static GLOBAL: Lazy<EndpointRegistry> = Lazy::new(EndpointRegistry::new);

/// Set of endpoints currently owned by a live detector
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    active: Arc<Mutex<HashSet<Endpoint>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by detectors unless told otherwise
    pub fn global() -> EndpointRegistry {
        GLOBAL.clone()
    }

    /// Take ownership of an endpoint
    pub fn claim(&self, endpoint: Endpoint) -> Result<EndpointLease, DetectorError> {
        let mut active = self.active.lock();

        if !active.insert(endpoint) {
            return Err(DetectorError::EndpointBusy(endpoint));
        }

        debug!(%endpoint, "Endpoint claimed");

        Ok(EndpointLease {
            endpoint,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_claimed(&self, endpoint: Endpoint) -> bool {
        self.active.lock().contains(&endpoint)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

/// Ownership of one endpoint, released on drop
#[derive(Debug)]
pub struct EndpointLease {
    endpoint: Endpoint,
    active: Arc<Mutex<HashSet<Endpoint>>>,
}

impl EndpointLease {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}

impl Drop for EndpointLease {
    fn drop(&mut self) {
        self.active.lock().remove(&self.endpoint);
        debug!(endpoint = %self.endpoint, "Endpoint released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_rejected() {
        let registry = EndpointRegistry::new();
        let endpoint = Endpoint::new(0, 0);

        let _lease = registry.claim(endpoint).unwrap();

        assert!(matches!(
            registry.claim(endpoint),
            Err(DetectorError::EndpointBusy(e)) if e == endpoint
        ));
    }

    #[test]
    fn test_drop_releases() {
        let registry = EndpointRegistry::new();
        let endpoint = Endpoint::new(1, 2);

        let lease = registry.claim(endpoint).unwrap();
        assert!(registry.is_claimed(endpoint));

        drop(lease);
        assert!(!registry.is_claimed(endpoint));
        assert!(registry.claim(endpoint).is_ok());
    }

    #[test]
    fn test_distinct_endpoints_coexist() {
        let registry = EndpointRegistry::new();

        let _a = registry.claim(Endpoint::new(0, 0)).unwrap();
        let _b = registry.claim(Endpoint::new(0, 1)).unwrap();

        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = EndpointRegistry::new();
        let clone = registry.clone();

        let _lease = registry.claim(Endpoint::new(4, 4)).unwrap();
        assert!(clone.is_claimed(Endpoint::new(4, 4)));
    }
}
