use permsheet_permission::{Authorization, PermissionKind};

/// One row of the sheet: a permission and what the user decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionState {
    /// Which permission this row tracks.
    pub kind: PermissionKind,
    /// The current decision.
    pub authorization: Authorization,
}

impl PermissionState {
    /// A row seeded with the given authorization.
    #[must_use]
    pub const fn new(kind: PermissionKind, authorization: Authorization) -> Self {
        Self {
            kind,
            authorization,
        }
    }

    /// Row label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Row icon.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    /// Whether access was allowed.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self.authorization, Authorization::Granted)
    }

    /// Whether access was refused.
    #[must_use]
    pub const fn is_denied(&self) -> bool {
        matches!(self.authorization, Authorization::Denied)
    }
}

/// Where the sequencer is in its walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// An undetermined entry is waiting to be requested.
    Idle,
    /// A prompt for this kind is on screen.
    Requesting(PermissionKind),
    /// The location prompt was raised; its answer comes through a notification.
    AwaitingLocation,
    /// Every entry is granted or denied.
    AllResolved,
}

/// Change notifications for whoever renders the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetEvent {
    /// The sequencer moved to a new phase.
    Phase(Phase),
    /// A row changed.
    Recorded(PermissionState),
    /// The sheet was shown or hidden.
    Visibility(bool),
}
