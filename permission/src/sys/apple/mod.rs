//! Apple platform (iOS/macOS) permission implementation using swift-bridge.
//!
//! The Swift side answers from `AVCaptureDevice`, `PHPhotoLibrary` and
//! `CLLocationManager`. Requests return immediately; Swift reports the
//! user's answer later through `on_permission_result`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use futures::channel::oneshot;

use crate::{PermissionError, PermissionKind, PermissionStatus};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn pending_requests() -> &'static Mutex<HashMap<u64, oneshot::Sender<PermissionStatus>>> {
    static LOCK: OnceLock<Mutex<HashMap<u64, oneshot::Sender<PermissionStatus>>>> =
        OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(HashMap::new()))
}

#[swift_bridge::bridge]
mod ffi {
    // Shared enum bridged between Rust and Swift
    enum PermissionType {
        Camera,
        Microphone,
        PhotoLibrary,
        Location,
    }

    enum PermissionResult {
        NotDetermined,
        Restricted,
        Denied,
        Granted,
    }

    extern "Swift" {
        fn check_permission(permission: PermissionType) -> PermissionResult;
        fn request_permission(permission: PermissionType, cb_id: u64);
        fn open_app_settings() -> bool;
    }

    extern "Rust" {
        fn on_permission_result(cb_id: u64, result: PermissionResult);
    }
}

fn on_permission_result(cb_id: u64, result: ffi::PermissionResult) {
    if let Ok(mut map) = pending_requests().lock() {
        if let Some(tx) = map.remove(&cb_id) {
            let _ = tx.send(status_from_ffi(result));
        }
    }
}

const fn kind_to_ffi(kind: PermissionKind) -> ffi::PermissionType {
    match kind {
        PermissionKind::Camera => ffi::PermissionType::Camera,
        PermissionKind::Microphone => ffi::PermissionType::Microphone,
        PermissionKind::PhotoLibrary => ffi::PermissionType::PhotoLibrary,
        PermissionKind::Location => ffi::PermissionType::Location,
    }
}

const fn status_from_ffi(result: ffi::PermissionResult) -> PermissionStatus {
    match result {
        ffi::PermissionResult::NotDetermined => PermissionStatus::NotDetermined,
        ffi::PermissionResult::Restricted => PermissionStatus::Restricted,
        ffi::PermissionResult::Denied => PermissionStatus::Denied,
        ffi::PermissionResult::Granted => PermissionStatus::Granted,
    }
}

/// Check the status of a permission on Apple platforms.
pub fn check(kind: PermissionKind) -> PermissionStatus {
    status_from_ffi(ffi::check_permission(kind_to_ffi(kind)))
}

/// Request a permission on Apple platforms.
///
/// The returned future stays pending until the user dismisses the system
/// alert, without blocking the calling thread.
///
/// # Errors
/// Returns an error if the Swift side drops the request without answering.
pub async fn request(kind: PermissionKind) -> Result<PermissionStatus, PermissionError> {
    let (tx, rx) = oneshot::channel();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

    pending_requests()
        .lock()
        .map_err(|_| PermissionError::Unknown("permission callback registry poisoned".into()))?
        .insert(id, tx);

    ffi::request_permission(kind_to_ffi(kind), id);

    rx.await
        .map_err(|_| PermissionError::Unknown(format!("{kind} request was dropped")))
}

/// Open this app's page in Settings (iOS) or System Settings privacy (macOS).
///
/// # Errors
/// Returns an error if the settings URL could not be opened.
pub fn open_settings() -> Result<(), PermissionError> {
    if ffi::open_app_settings() {
        Ok(())
    } else {
        Err(PermissionError::Unknown(
            "settings URL could not be opened".into(),
        ))
    }
}
