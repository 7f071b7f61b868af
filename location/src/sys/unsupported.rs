//! Fallback for platforms without location authorization.

use std::sync::Arc;

use crate::{AuthorizationDelegate, LocationAuthorization, LocationBackend, LocationError, LocationResult};

/// Backend that never authorizes.
#[derive(Debug, Default)]
pub struct UnsupportedLocationBackend;

impl UnsupportedLocationBackend {
    /// Construct the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LocationBackend for UnsupportedLocationBackend {
    fn authorization_status(&self) -> LocationAuthorization {
        LocationAuthorization::NotDetermined
    }

    fn set_delegate(&self, _delegate: Arc<dyn AuthorizationDelegate>) {}

    fn request_authorization(&self) -> LocationResult<()> {
        Err(LocationError::NotSupported)
    }
}
