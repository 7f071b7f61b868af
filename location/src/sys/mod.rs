//! Platform-specific location authorization backends.

use std::sync::Arc;

use crate::LocationBackend;

#[cfg(any(target_os = "ios", target_os = "macos"))]
mod apple;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
mod unsupported;

#[cfg(any(target_os = "ios", target_os = "macos"))]
pub use apple::AppleLocationBackend as PlatformLocationBackend;

#[cfg(target_os = "windows")]
pub use windows::WindowsLocationBackend as PlatformLocationBackend;

#[cfg(target_os = "linux")]
pub use linux::LinuxLocationBackend as PlatformLocationBackend;

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
pub use unsupported::UnsupportedLocationBackend as PlatformLocationBackend;

/// The backend for the current platform.
#[must_use]
pub fn system_backend() -> Arc<dyn LocationBackend> {
    Arc::new(PlatformLocationBackend::new())
}
