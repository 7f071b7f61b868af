//! Linux permission implementation.
//!
//! On Linux, device access is handled at the system level via:
//! - File permissions (camera/microphone devices in /dev)
//! - Desktop portal systems (Flatpak/Snap sandboxing)
//! - User groups (e.g., 'video' group for camera access)
//!
//! There is no runtime prompt to sequence, so every kind reports granted.

use crate::{PermissionError, PermissionKind, PermissionStatus};

pub(crate) const fn check(_kind: PermissionKind) -> PermissionStatus {
    PermissionStatus::Granted
}

pub(crate) async fn request(_kind: PermissionKind) -> Result<PermissionStatus, PermissionError> {
    Ok(PermissionStatus::Granted)
}

pub(crate) const fn open_settings() -> Result<(), PermissionError> {
    // No common settings surface across desktop environments
    Err(PermissionError::NotSupported)
}
