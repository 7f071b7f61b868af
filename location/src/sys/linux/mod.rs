//! Linux location authorization.
//!
//! GeoClue2 grants access per desktop session rather than through an in-app
//! prompt, so the backend reports the app as always authorized and answers
//! each request by echoing that status to the delegate.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{AuthorizationDelegate, LocationAuthorization, LocationBackend, LocationError, LocationResult};

/// Backend for Linux desktops.
#[derive(Default)]
pub struct LinuxLocationBackend {
    delegate: Mutex<Option<Arc<dyn AuthorizationDelegate>>>,
}

impl LinuxLocationBackend {
    /// Construct a backend without a delegate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for LinuxLocationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinuxLocationBackend").finish()
    }
}

impl LocationBackend for LinuxLocationBackend {
    fn authorization_status(&self) -> LocationAuthorization {
        LocationAuthorization::AuthorizedAlways
    }

    fn set_delegate(&self, delegate: Arc<dyn AuthorizationDelegate>) {
        let mut guard = self.delegate.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(delegate);
    }

    fn request_authorization(&self) -> LocationResult<()> {
        let delegate = self
            .delegate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(LocationError::DelegateMissing)?;
        delegate.on_authorization_changed(self.authorization_status());
        Ok(())
    }
}
