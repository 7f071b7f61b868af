//! Permission catalog and cross-platform authorization queries.
//!
//! This crate names the runtime permissions a permission sheet can ask for,
//! fixes the order they are asked in, and answers "what does the OS say right
//! now" for each of them on iOS, macOS, Windows and Linux.

#![warn(missing_docs)]

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Platform-specific implementations.
pub mod sys;

/// Kinds of permission a sheet can request.
///
/// Variants are declared in request order, so the derived `Ord` agrees with
/// [`PermissionKind::ordinal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Access to the device camera.
    Camera,
    /// Access to the device microphone.
    Microphone,
    /// Access to the photo library.
    PhotoLibrary,
    /// Access to device location.
    Location,
}

impl PermissionKind {
    /// Every kind, in request order.
    pub const ALL: [Self; 4] = [
        Self::Camera,
        Self::Microphone,
        Self::PhotoLibrary,
        Self::Location,
    ];

    /// Position of this kind in the request sequence.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Camera => 0,
            Self::Microphone => 1,
            Self::PhotoLibrary => 2,
            Self::Location => 3,
        }
    }

    /// Human-readable label shown next to the status.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Microphone => "Microphone",
            Self::PhotoLibrary => "Photo Library",
            Self::Location => "Location",
        }
    }

    /// Symbol name used for the row icon.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Camera => "camera.fill",
            Self::Microphone => "mic.fill",
            Self::PhotoLibrary => "photo.on.rectangle",
            Self::Location => "location.fill",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The status of a permission as reported by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is restricted (e.g., parental controls on iOS).
    Restricted,
    /// Permission has not been requested yet.
    NotDetermined,
}

impl PermissionStatus {
    /// Collapse the OS status into the tri-state a sheet tracks.
    #[must_use]
    pub const fn authorization(self) -> Authorization {
        match self {
            Self::Granted => Authorization::Granted,
            Self::Denied | Self::Restricted => Authorization::Denied,
            Self::NotDetermined => Authorization::Unknown,
        }
    }
}

/// Tri-state authorization tracked per permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    /// Not decided yet.
    #[default]
    Unknown,
    /// The user allowed access.
    Granted,
    /// The user refused access, or it is restricted.
    Denied,
}

impl Authorization {
    /// Whether the user has made a decision.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<PermissionStatus> for Authorization {
    fn from(status: PermissionStatus) -> Self {
        status.authorization()
    }
}

/// Errors that can occur when requesting permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The permission type is not supported on this platform.
    #[error("permission not supported on this platform")]
    NotSupported,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Source of truth for permission state.
///
/// The sheet never caches what a backend returns beyond its own session, so
/// implementations should answer from live OS state on every call.
pub trait PermissionBackend: fmt::Debug + Send + Sync {
    /// Query the current status without prompting.
    fn check(&self, kind: PermissionKind) -> PermissionStatus;

    /// Prompt the user if the permission is still undetermined.
    ///
    /// # Errors
    /// Returns a `PermissionError` if the platform cannot issue the request.
    fn request(
        &self,
        kind: PermissionKind,
    ) -> BoxFuture<'static, Result<PermissionStatus, PermissionError>>;

    /// Navigate to the OS settings surface for this app.
    ///
    /// # Errors
    /// Returns a `PermissionError` if the settings surface could not be opened.
    fn open_settings(&self) -> Result<(), PermissionError>;
}

/// [`PermissionBackend`] backed by the current platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermissions;

impl PermissionBackend for SystemPermissions {
    fn check(&self, kind: PermissionKind) -> PermissionStatus {
        check(kind)
    }

    fn request(
        &self,
        kind: PermissionKind,
    ) -> BoxFuture<'static, Result<PermissionStatus, PermissionError>> {
        Box::pin(request(kind))
    }

    fn open_settings(&self) -> Result<(), PermissionError> {
        open_settings()
    }
}

/// Check the current status of a permission without requesting it.
#[must_use]
pub fn check(kind: PermissionKind) -> PermissionStatus {
    sys::check(kind)
}

/// Request a permission from the user.
///
/// If the permission has already been granted or denied, this returns
/// the current status without showing a prompt.
///
/// # Errors
/// Returns a `PermissionError` if:
/// - The permission type is not supported on this platform.
/// - An underlying platform error occurs.
pub async fn request(kind: PermissionKind) -> Result<PermissionStatus, PermissionError> {
    log::debug!("requesting {kind} permission");
    sys::request(kind).await
}

/// Open the system settings page where the user can change permissions.
///
/// # Errors
/// Returns a `PermissionError` if the platform has no settings surface or
/// refuses to open it.
pub fn open_settings() -> Result<(), PermissionError> {
    sys::open_settings()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_sorted_by_ordinal() {
        let ordinals: Vec<u8> = PermissionKind::ALL.iter().map(|k| k.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);

        let mut sorted = vec![
            PermissionKind::Location,
            PermissionKind::Camera,
            PermissionKind::PhotoLibrary,
            PermissionKind::Microphone,
        ];
        sorted.sort();
        assert_eq!(sorted, PermissionKind::ALL);
    }

    #[test]
    fn labels_and_icons() {
        assert_eq!(PermissionKind::PhotoLibrary.label(), "Photo Library");
        assert_eq!(PermissionKind::Microphone.icon(), "mic.fill");
        assert_eq!(PermissionKind::Location.to_string(), "Location");
    }

    #[test]
    fn restricted_collapses_to_denied() {
        assert_eq!(
            Authorization::from(PermissionStatus::Restricted),
            Authorization::Denied
        );
        assert_eq!(
            Authorization::from(PermissionStatus::NotDetermined),
            Authorization::Unknown
        );
        assert_eq!(
            Authorization::from(PermissionStatus::Granted),
            Authorization::Granted
        );
        assert!(!Authorization::Unknown.is_resolved());
        assert!(Authorization::Denied.is_resolved());
    }

    #[test]
    fn kinds_use_snake_case_names() {
        let json = serde_json::to_string(&PermissionKind::PhotoLibrary).unwrap();
        assert_eq!(json, "\"photo_library\"");

        let kind: PermissionKind = serde_json::from_str("\"microphone\"").unwrap();
        assert_eq!(kind, PermissionKind::Microphone);
    }

    #[test]
    fn system_backend_matches_free_functions() {
        let backend = SystemPermissions;
        for kind in PermissionKind::ALL {
            assert_eq!(backend.check(kind), check(kind));
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn linux_grants_without_prompting() {
        for kind in PermissionKind::ALL {
            assert_eq!(SystemPermissions.request(kind).await, Ok(PermissionStatus::Granted));
        }
        assert_eq!(open_settings(), Err(PermissionError::NotSupported));
    }
}
