//! # Permsheet
//!
//! A sequential runtime-permission sheet for applications built with WaterUI.
//!
//! Permsheet walks a user through the camera, microphone, photo library and
//! location prompts one at a time, tracks what was granted or denied, and only
//! lets the sheet close once everything is authorized.
//!
//! ## Features
//!
//! - `permission`: The permission catalog and per-platform status queries.
//! - `location`: Location authorization with delegate-style change notifications.
//! - `sheet`: The sequencer that drives a permission session.
//!
//! `full` (the default) enables everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! permsheet = { version = "0.1" }
//! ```
//!
//! ```rust,no_run
//! use permsheet::permission::PermissionKind;
//! use permsheet::sheet::PermissionSheet;
//!
//! async fn onboard() {
//!     let mut sheet = PermissionSheet::system([PermissionKind::Camera, PermissionKind::Location]);
//!     sheet.run().await;
//!     if sheet.dismiss().is_err() && sheet.has_any_denial() {
//!         sheet.open_settings();
//!     }
//! }
//! ```

#[cfg(feature = "location")]
pub use permsheet_location as location;

#[cfg(feature = "permission")]
pub use permsheet_permission as permission;

#[cfg(feature = "sheet")]
pub use permsheet_sheet as sheet;
