/// Hardware endpoint identifiers
///
/// A card/device pair names one voice-capture endpoint on the audio
/// subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card and device index of a hardware voice-capture endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Sound card index
    pub card: i32,

    /// Device index on the card
    pub device: i32,
}

impl Endpoint {
    pub const fn new(card: i32, device: i32) -> Self {
        Self { card, device }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card {}/device {}", self.card, self.device)
    }
}
