//! Windows location authorization using the WinRT Geolocator.
//!
//! `authorization_status` reads the `location` app capability and never
//! prompts. `request_authorization` runs `RequestAccessAsync` on a worker
//! thread and reports the answer to the delegate from there.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};
use windows::Security::Authorization::AppCapabilityAccess::{
    AppCapability, AppCapabilityAccessStatus,
};
use windows::core::HSTRING;

use crate::{AuthorizationDelegate, LocationAuthorization, LocationBackend, LocationError, LocationResult};

/// Backend using the `location` app capability and `Geolocator`.
#[derive(Default)]
pub struct WindowsLocationBackend {
    delegate: Mutex<Option<Arc<dyn AuthorizationDelegate>>>,
}

impl WindowsLocationBackend {
    /// Construct a backend without a delegate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for WindowsLocationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsLocationBackend").finish()
    }
}

fn capability_status() -> LocationResult<LocationAuthorization> {
    let access = AppCapability::Create(&HSTRING::from("location"))
        .and_then(|cap| cap.CheckAccess())
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;

    Ok(match access {
        AppCapabilityAccessStatus::Allowed => LocationAuthorization::AuthorizedWhenInUse,
        AppCapabilityAccessStatus::DeniedByUser => LocationAuthorization::Denied,
        AppCapabilityAccessStatus::DeniedBySystem | AppCapabilityAccessStatus::NotDeclaredByApp => {
            LocationAuthorization::Restricted
        }
        _ => LocationAuthorization::NotDetermined,
    })
}

fn prompt_for_access() -> LocationResult<LocationAuthorization> {
    let access = Geolocator::RequestAccessAsync()
        .and_then(|op| op.get())
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;

    Ok(match access {
        GeolocationAccessStatus::Allowed => LocationAuthorization::AuthorizedWhenInUse,
        GeolocationAccessStatus::Denied => LocationAuthorization::Denied,
        _ => LocationAuthorization::NotDetermined,
    })
}

impl LocationBackend for WindowsLocationBackend {
    fn authorization_status(&self) -> LocationAuthorization {
        capability_status().unwrap_or(LocationAuthorization::NotDetermined)
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

        std::thread::spawn(move || match prompt_for_access() {
            Ok(status) => delegate.on_authorization_changed(status),
            Err(err) => {
                warn!("location access request failed: {err}");
                delegate.on_authorization_changed(LocationAuthorization::Denied);
            }
        });
        Ok(())
    }
}
