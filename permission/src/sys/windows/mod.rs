//! Windows permission implementation using WinRT.
//!
//! Status checks go through `AppCapability`, which never prompts. Only
//! [`request`] calls `Geolocator::RequestAccessAsync`, on a worker thread.

use futures::channel::oneshot;
use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};
use windows::Security::Authorization::AppCapabilityAccess::{
    AppCapability, AppCapabilityAccessStatus,
};
use windows::core::HSTRING;

use crate::{PermissionError, PermissionKind, PermissionStatus};

const PRIVACY_SETTINGS_URI: &str = "ms-settings:privacy";

pub(crate) fn check(kind: PermissionKind) -> PermissionStatus {
    match kind {
        PermissionKind::Location => location_access(),
        _ => PermissionStatus::Granted, // Device access is implicit for desktop apps
    }
}

pub(crate) async fn request(kind: PermissionKind) -> Result<PermissionStatus, PermissionError> {
    if kind != PermissionKind::Location {
        return Ok(check(kind));
    }

    let (tx, rx) = oneshot::channel();

    std::thread::spawn(move || {
        let status = Geolocator::RequestAccessAsync()
            .and_then(|op| op.get())
            .map(|access| match access {
                GeolocationAccessStatus::Allowed => PermissionStatus::Granted,
                GeolocationAccessStatus::Denied => PermissionStatus::Denied,
                _ => PermissionStatus::NotDetermined,
            })
            .map_err(|e| PermissionError::Unknown(e.message().to_string()));

        let _ = tx.send(status);
    });

    rx.await
        .map_err(|_| PermissionError::Unknown("location request thread exited".into()))?
}

pub(crate) fn open_settings() -> Result<(), PermissionError> {
    use windows::Foundation::Uri;
    use windows::System::Launcher;

    let uri = Uri::CreateUri(&HSTRING::from(PRIVACY_SETTINGS_URI))
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))?;
    let launched = Launcher::LaunchUriAsync(&uri)
        .and_then(|op| op.get())
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))?;

    if launched {
        Ok(())
    } else {
        Err(PermissionError::Unknown("settings launch refused".into()))
    }
}

fn location_access() -> PermissionStatus {
    match AppCapability::Create(&HSTRING::from("location")).and_then(|cap| cap.CheckAccess()) {
        Ok(AppCapabilityAccessStatus::Allowed) => PermissionStatus::Granted,
        Ok(AppCapabilityAccessStatus::DeniedByUser) => PermissionStatus::Denied,
        Ok(AppCapabilityAccessStatus::DeniedBySystem | AppCapabilityAccessStatus::NotDeclaredByApp) => {
            PermissionStatus::Restricted
        }
        Ok(_) | Err(_) => PermissionStatus::NotDetermined,
    }
}
