//! Location authorization with delegate-style change notifications.
//!
//! Unlike camera or microphone access, the location prompt does not answer
//! the call that raised it. The platform reports the user's choice later,
//! through a delegate, and may report further changes at any time. This crate
//! models that as a [`LocationBackend`] that accepts an
//! [`AuthorizationDelegate`], plus an [`AuthorizationWatcher`] that turns the
//! delegate callbacks into an async stream of events.

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Platform-specific implementations.
pub mod sys;

mod watch;

pub use permsheet_permission::{Authorization, PermissionKind, PermissionStatus};
pub use watch::{AuthorizationEvents, AuthorizationWatcher};

/// Location authorization as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationAuthorization {
    /// The user has not chosen yet.
    NotDetermined,
    /// Access is blocked by policy and the user cannot change it.
    Restricted,
    /// The user refused access.
    Denied,
    /// Access allowed at any time, including in the background.
    AuthorizedAlways,
    /// Access allowed while the app is in use.
    AuthorizedWhenInUse,
}

impl LocationAuthorization {
    /// Whether this is one of the authorized variants.
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedAlways | Self::AuthorizedWhenInUse)
    }

    /// Whether access is refused, either by the user or by policy.
    #[must_use]
    pub const fn is_refused(self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }

    /// The equivalent generic permission status.
    #[must_use]
    pub const fn permission_status(self) -> PermissionStatus {
        match self {
            Self::NotDetermined => PermissionStatus::NotDetermined,
            Self::Restricted => PermissionStatus::Restricted,
            Self::Denied => PermissionStatus::Denied,
            Self::AuthorizedAlways | Self::AuthorizedWhenInUse => PermissionStatus::Granted,
        }
    }

    /// Decode a status relayed by a platform layer as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Serialization`] for anything that is not one
    /// of the snake_case variant names.
    pub fn from_json(payload: &str) -> LocationResult<Self> {
        serde_json::from_str(payload).map_err(|err| LocationError::Serialization {
            message: err.to_string(),
        })
    }
}

impl From<LocationAuthorization> for Authorization {
    fn from(status: LocationAuthorization) -> Self {
        status.permission_status().authorization()
    }
}

/// Errors that can occur when asking for location authorization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The backend needs a delegate before it can report changes.
    #[error("no authorization delegate registered")]
    DelegateMissing,
    /// Location authorization is not available on this platform.
    #[error("location authorization not supported on this platform")]
    NotSupported,
    /// A status payload from the platform could not be decoded.
    #[error("malformed authorization payload: {message}")]
    Serialization {
        /// Decoder message.
        message: String,
    },
    /// The platform rejected the call.
    #[error("location backend error: {0}")]
    Backend(String),
}

/// Result alias for location authorization calls.
pub type LocationResult<T> = Result<T, LocationError>;

/// Receives location authorization changes.
pub trait AuthorizationDelegate: Send + Sync {
    /// Called whenever the platform reports a (possibly unchanged) status.
    fn on_authorization_changed(&self, status: LocationAuthorization);
}

/// Platform hook for location authorization.
pub trait LocationBackend: fmt::Debug + Send + Sync {
    /// Current authorization, queried synchronously.
    fn authorization_status(&self) -> LocationAuthorization;

    /// Register the delegate that receives authorization changes.
    ///
    /// Replaces any previously registered delegate.
    fn set_delegate(&self, delegate: Arc<dyn AuthorizationDelegate>);

    /// Show the platform prompt.
    ///
    /// Returns as soon as the prompt is raised. The user's answer arrives
    /// through the registered delegate.
    ///
    /// # Errors
    ///
    /// Returns an error if no delegate is registered or the platform refuses
    /// to raise the prompt.
    fn request_authorization(&self) -> LocationResult<()>;
}

/// Shared handle to a location authorization backend.
#[derive(Debug, Clone)]
pub struct LocationManager {
    backend: Arc<dyn LocationBackend>,
}

impl LocationManager {
    /// Creates a manager over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn LocationBackend>) -> Self {
        Self { backend }
    }

    /// Creates a manager over the backend for the current platform.
    #[must_use]
    pub fn system() -> Self {
        Self::new(sys::system_backend())
    }

    /// Current authorization.
    #[must_use]
    pub fn authorization_status(&self) -> LocationAuthorization {
        self.backend.authorization_status()
    }

    /// Registers the delegate that receives authorization changes.
    pub fn set_delegate(&self, delegate: Arc<dyn AuthorizationDelegate>) {
        self.backend.set_delegate(delegate);
    }

    /// Raises the location prompt without waiting for the answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot raise the prompt.
    pub fn request_authorization(&self) -> LocationResult<()> {
        self.backend.request_authorization()
    }
}
