//! Sequential permission request sheet.
//!
//! A [`PermissionSheet`] is created with the permissions a screen needs. It
//! asks the OS which of them are already decided, then prompts for the rest
//! one at a time in a fixed order: camera, microphone, photo library,
//! location. Camera, microphone and photo library answers come back from the
//! request itself. The location answer arrives later through a delegate, so
//! the sheet parks on that entry until the notification lands.
//!
//! The sheet stays up until every permission is granted. A denial is recorded
//! and shown, never retried; the user can only change it in system settings,
//! and a new sheet will pick that change up.

#![warn(missing_docs)]

mod config;
mod error;
mod session;
mod state;

pub use config::SheetConfig;
pub use error::SheetError;
pub use session::{PermissionSheet, SheetEvents};
pub use state::{PermissionState, Phase, SheetEvent};

pub use permsheet_location::{LocationAuthorization, LocationManager};
pub use permsheet_permission::{Authorization, PermissionBackend, PermissionKind};
