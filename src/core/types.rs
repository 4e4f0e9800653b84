//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulated game time in seconds, as supplied by the frame driver
pub type Seconds = f32;

/// Unique identifier for a module construction site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(pub Uuid);

impl SiteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp an externally supplied frame delta to something the timers can use.
///
/// Negative and non-finite values count as a paused frame.
pub fn sanitize_delta(dt: Seconds) -> Seconds {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}
