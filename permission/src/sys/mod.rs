//! Platform-specific permission implementations.

#[cfg(any(target_os = "ios", target_os = "macos"))]
mod apple;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

// Re-export platform implementations
#[cfg(any(target_os = "ios", target_os = "macos"))]
pub(crate) use apple::{check, open_settings, request};

#[cfg(target_os = "windows")]
pub(crate) use windows::{check, open_settings, request};

#[cfg(target_os = "linux")]
pub(crate) use linux::{check, open_settings, request};

// Fallback for unsupported platforms (compile-time stub)
#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
pub(crate) const fn check(_kind: crate::PermissionKind) -> crate::PermissionStatus {
    crate::PermissionStatus::NotDetermined
}

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
pub(crate) async fn request(
    _kind: crate::PermissionKind,
) -> Result<crate::PermissionStatus, crate::PermissionError> {
    Err(crate::PermissionError::NotSupported)
}

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
pub(crate) const fn open_settings() -> Result<(), crate::PermissionError> {
    Err(crate::PermissionError::NotSupported)
}
