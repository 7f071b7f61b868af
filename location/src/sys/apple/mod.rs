//! Apple platform (iOS/macOS) location authorization using swift-bridge.
//!
//! The Swift side owns a `CLLocationManager` and forwards every
//! `locationManagerDidChangeAuthorization` callback to [`StatusRelay`] as a
//! JSON string holding the snake_case status name.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::error;

use crate::{AuthorizationDelegate, LocationAuthorization, LocationBackend, LocationError, LocationResult};

#[swift_bridge::bridge]
mod ffi {
    extern "Rust" {
        type StatusRelay;

        fn dispatch_status(self: &StatusRelay, json_status: &str);
    }

    extern "Swift" {
        type AppleAuthorizationManager;

        #[swift_bridge(init)]
        fn new(relay: StatusRelay) -> AppleAuthorizationManager;

        fn request_when_in_use(self: &AppleAuthorizationManager);

        fn current_location_authorization() -> String;
    }
}

/// Backend implementation backed by `CoreLocation` via swift-bridge.
#[derive(Default)]
pub struct AppleLocationBackend {
    manager: Mutex<Option<ffi::AppleAuthorizationManager>>,
}

// Safety: AppleAuthorizationManager is protected by a Mutex and only accessed from the main thread.
// The raw pointer it contains is managed by the Swift side and synchronized appropriately.
#[allow(clippy::non_send_fields_in_send_ty)]
unsafe impl Send for AppleLocationBackend {}
unsafe impl Sync for AppleLocationBackend {}

impl fmt::Debug for AppleLocationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleLocationBackend").finish()
    }
}

impl AppleLocationBackend {
    /// Construct a backend without a delegate. A delegate must be registered before requesting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationBackend for AppleLocationBackend {
    fn authorization_status(&self) -> LocationAuthorization {
        let payload = ffi::current_location_authorization();
        LocationAuthorization::from_json(&payload).unwrap_or_else(|err| {
            error!("unreadable location authorization from CoreLocation: {err}");
            LocationAuthorization::NotDetermined
        })
    }

    fn set_delegate(&self, delegate: Arc<dyn AuthorizationDelegate>) {
        let manager = ffi::AppleAuthorizationManager::new(StatusRelay::new(delegate));
        let mut guard = self.manager.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(manager);
    }

    fn request_authorization(&self) -> LocationResult<()> {
        let guard = self.manager.lock().unwrap_or_else(PoisonError::into_inner);
        let manager = guard.as_ref().ok_or(LocationError::DelegateMissing)?;
        manager.request_when_in_use();
        Ok(())
    }
}

struct StatusRelay {
    delegate: Arc<dyn AuthorizationDelegate>,
}

impl StatusRelay {
    fn new(delegate: Arc<dyn AuthorizationDelegate>) -> Self {
        Self { delegate }
    }

    fn dispatch_status(&self, json_status: &str) {
        match LocationAuthorization::from_json(json_status) {
            Ok(status) => self.delegate.on_authorization_changed(status),
            Err(err) => error!("dropping location authorization callback: {err}"),
        }
    }
}

impl fmt::Debug for StatusRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusRelay").finish()
    }
}
