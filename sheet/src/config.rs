use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SheetError;

const DEFAULT_REQUEST_DELAY_MS: u64 = 500;
const DEFAULT_MAX_LOCATION_RETRIES: u32 = 3;

/// Tunables for a permission sheet.
///
/// Missing fields fall back to their defaults when deserialized, so a host
/// can ship a partial JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Pause between two consecutive prompts, in milliseconds.
    ///
    /// Keeps one system alert from animating in over the previous one.
    /// Zero disables the pause.
    pub request_delay_ms: u64,
    /// How many times the location prompt is re-raised when the platform
    /// keeps reporting an undetermined status.
    pub max_location_retries: u32,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            max_location_retries: DEFAULT_MAX_LOCATION_RETRIES,
        }
    }
}

impl SheetConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::Config`] if the payload is not a valid config object.
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pause between prompts.
    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Set the pause between prompts.
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the bound on location re-requests.
    #[must_use]
    pub const fn with_max_location_retries(mut self, retries: u32) -> Self {
        self.max_location_retries = retries;
        self
    }
}
