use std::fmt;
use std::sync::Arc;

use async_channel::{Receiver, Sender, unbounded};
use futures::future::{self, BoxFuture, Either};
use futures_timer::Delay;
use log::{debug, info, warn};
use permsheet_location::{
    AuthorizationEvents, AuthorizationWatcher, LocationAuthorization, LocationManager,
};
use permsheet_permission::{
    Authorization, PermissionBackend, PermissionError, PermissionKind, PermissionStatus,
    SystemPermissions,
};

use crate::{PermissionState, Phase, SheetConfig, SheetError, SheetEvent};

/// A permission request session.
///
/// Entries are fixed at construction and kept in request order. The cursor
/// always rests on the first undecided entry, or past the end once all of
/// them are decided.
pub struct PermissionSheet {
    states: Vec<PermissionState>,
    cursor: usize,
    visible: bool,
    phase: Phase,
    in_flight: Option<PermissionKind>,
    catalog: Arc<dyn PermissionBackend>,
    location: AuthorizationWatcher,
    location_events: AuthorizationEvents,
    location_requested: bool,
    location_pending: bool,
    location_retries: u32,
    prompted: bool,
    config: SheetConfig,
    observers: Vec<Sender<SheetEvent>>,
}

impl fmt::Debug for PermissionSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionSheet")
            .field("states", &self.states)
            .field("cursor", &self.cursor)
            .field("visible", &self.visible)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl PermissionSheet {
    /// Starts a session for `kinds`.
    ///
    /// Duplicates are dropped and the entries sorted into request order. Each
    /// entry is seeded from `catalog`. The sheet starts visible if anything
    /// is not yet granted.
    pub fn new(
        kinds: impl IntoIterator<Item = PermissionKind>,
        catalog: Arc<dyn PermissionBackend>,
        location: LocationManager,
        config: SheetConfig,
    ) -> Self {
        let mut kinds: Vec<PermissionKind> = kinds.into_iter().collect();
        kinds.sort_unstable();
        kinds.dedup();

        let states: Vec<PermissionState> = kinds
            .into_iter()
            .map(|kind| PermissionState::new(kind, catalog.check(kind).authorization()))
            .collect();
        debug!("seeded permission sheet: {states:?}");

        let visible = states.iter().any(|state| !state.is_granted());
        let location = AuthorizationWatcher::new(location);
        let location_events = location.events();

        let mut sheet = Self {
            states,
            cursor: 0,
            visible,
            phase: Phase::Idle,
            in_flight: None,
            catalog,
            location,
            location_events,
            location_requested: false,
            location_pending: false,
            location_retries: 0,
            prompted: false,
            config,
            observers: Vec::new(),
        };
        sheet.refresh();
        sheet
    }

    /// Starts a session against the current platform with default settings.
    pub fn system(kinds: impl IntoIterator<Item = PermissionKind>) -> Self {
        Self::new(
            kinds,
            Arc::new(SystemPermissions),
            LocationManager::system(),
            SheetConfig::default(),
        )
    }

    /// All entries, in request order.
    #[must_use]
    pub fn states(&self) -> &[PermissionState] {
        &self.states
    }

    /// The entry for `kind`, if this session tracks it.
    #[must_use]
    pub fn state(&self, kind: PermissionKind) -> Option<PermissionState> {
        self.states.iter().copied().find(|state| state.kind == kind)
    }

    /// Index of the next undecided entry, or `None` once all are decided.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        (self.cursor < self.states.len()).then_some(self.cursor)
    }

    /// Whether the sheet should be on screen.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current sequencer phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The configuration this session runs with.
    #[must_use]
    pub const fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// Whether every entry is granted or denied.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cursor().is_none()
    }

    /// Whether every entry is granted.
    #[must_use]
    pub fn is_all_granted(&self) -> bool {
        self.states.iter().all(PermissionState::is_granted)
    }

    /// Whether any entry is denied.
    ///
    /// Hosts use this to decide whether to offer a way into system settings.
    #[must_use]
    pub fn has_any_denial(&self) -> bool {
        self.states.iter().any(PermissionState::is_denied)
    }

    /// Hides the sheet.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::NotAllGranted`] while anything is denied or
    /// undecided. The sheet stays visible in that case.
    pub fn dismiss(&mut self) -> Result<(), SheetError> {
        if !self.is_all_granted() {
            let denied = self.states.iter().filter(|s| s.is_denied()).count();
            let pending = self.states.len() - denied - self.granted_count();
            return Err(SheetError::NotAllGranted { denied, pending });
        }

        self.set_visible(false);
        Ok(())
    }

    /// Opens the system settings page. Failures are ignored.
    pub fn open_settings(&self) {
        if let Err(err) = self.catalog.open_settings() {
            debug!("could not open system settings: {err}");
        }
    }

    /// Subscribes to row, phase and visibility changes.
    pub fn subscribe(&mut self) -> SheetEvents {
        let (sender, receiver) = unbounded();
        self.observers.push(sender);
        SheetEvents { receiver }
    }

    /// Prompts for undecided entries in order until one of them is location.
    ///
    /// Each prompt suspends until the user answers; the answer is recorded
    /// and the walk moves on, also past denials. Location is only raised
    /// here, and this returns right after, leaving the cursor on it until
    /// [`on_location_status_changed`](Self::on_location_status_changed)
    /// sees the answer. Location notifications that arrive while another
    /// prompt is open are applied as they come.
    pub async fn request_next(&mut self) {
        let events = self.location_events.clone();

        while let Some(index) = self.cursor() {
            let kind = self.states[index].kind;

            if kind == PermissionKind::Location {
                if !self.location_pending {
                    self.pause_between_prompts().await;
                    self.apply_queued_location_events();
                    if self.cursor() != Some(index) {
                        continue;
                    }
                    if !self.location_pending {
                        self.request_location();
                    }
                }
                return;
            }

            self.pause_between_prompts().await;
            debug!("prompting for {kind}");
            self.in_flight = Some(kind);
            self.refresh();

            let request = self.catalog.request(kind);
            let outcome = self.await_request(request, &events).await;

            self.in_flight = None;
            let authorization = match outcome {
                Ok(status) => resolved(status),
                Err(err) => {
                    warn!("{kind} request failed, recording as denied: {err}");
                    Authorization::Denied
                }
            };
            self.record(index, authorization);
        }
    }

    /// Applies a location authorization change reported by the platform.
    ///
    /// An undetermined status resets the entry and raises the prompt again,
    /// but only once location has been asked for in this session and at most
    /// `max_location_retries` times; after that the entry counts as denied.
    /// A refused status also forces the sheet back on screen.
    pub fn on_location_status_changed(&mut self, status: LocationAuthorization) {
        let Some(index) = self
            .states
            .iter()
            .position(|state| state.kind == PermissionKind::Location)
        else {
            debug!("ignoring location change to {status:?}: not part of this sheet");
            return;
        };

        self.location_pending = false;

        match status {
            LocationAuthorization::NotDetermined => {
                self.record(index, Authorization::Unknown);
                if !self.location_requested {
                    return;
                }
                if self.location_retries < self.config.max_location_retries {
                    self.location_retries += 1;
                    debug!(
                        "location still undetermined, asking again ({}/{})",
                        self.location_retries, self.config.max_location_retries
                    );
                    self.request_location();
                } else {
                    warn!(
                        "location still undetermined after {} re-requests, recording as denied",
                        self.location_retries
                    );
                    self.record(index, Authorization::Denied);
                    self.set_visible(true);
                }
            }
            status if status.is_refused() => {
                self.record(index, Authorization::Denied);
                self.set_visible(true);
            }
            status => self.record(index, Authorization::from(status)),
        }
    }

    /// Drives the session until every entry is decided.
    ///
    /// Prompts in order, then keeps consuming location notifications while
    /// the location entry is open.
    pub async fn run(&mut self) {
        let events = self.location_events.clone();
        self.request_next().await;

        while !self.is_resolved() {
            if let Some(status) = events.next().await {
                self.on_location_status_changed(status);
                self.request_next().await;
            } else {
                warn!("location notifications closed before the sheet resolved");
                if let Some(index) = self.cursor() {
                    self.record(index, Authorization::Denied);
                }
            }
        }
    }

    async fn await_request(
        &mut self,
        mut request: BoxFuture<'static, Result<PermissionStatus, PermissionError>>,
        events: &AuthorizationEvents,
    ) -> Result<PermissionStatus, PermissionError> {
        loop {
            let next_event = Box::pin(events.next());
            match future::select(request, next_event).await {
                Either::Left((outcome, _)) => return outcome,
                Either::Right((Some(status), pending)) => {
                    self.on_location_status_changed(status);
                    request = pending;
                }
                Either::Right((None, pending)) => return pending.await,
            }
        }
    }

    async fn pause_between_prompts(&mut self) {
        let delay = self.config.request_delay();
        if self.prompted && !delay.is_zero() {
            Delay::new(delay).await;
        }
        self.prompted = true;
    }

    /// Applies notifications that were queued before the prompt is raised,
    /// so a status reported at registration is never mistaken for an answer.
    fn apply_queued_location_events(&mut self) {
        while let Some(status) = self.location_events.try_next() {
            self.on_location_status_changed(status);
        }
    }

    fn request_location(&mut self) {
        self.location_requested = true;
        match self.location.request() {
            Ok(()) => {
                debug!("location prompt raised");
                self.location_pending = true;
                self.refresh();
            }
            Err(err) => {
                warn!("could not raise location prompt, recording as denied: {err}");
                if let Some(index) = self
                    .states
                    .iter()
                    .position(|state| state.kind == PermissionKind::Location)
                {
                    self.record(index, Authorization::Denied);
                }
                self.set_visible(true);
            }
        }
    }

    fn record(&mut self, index: usize, authorization: Authorization) {
        let state = &mut self.states[index];
        if state.authorization != authorization {
            state.authorization = authorization;
            let state = *state;
            debug!("{} is now {:?}", state.kind, state.authorization);
            self.emit(SheetEvent::Recorded(state));
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.cursor = self
            .states
            .iter()
            .position(|state| !state.authorization.is_resolved())
            .unwrap_or(self.states.len());

        let phase = if let Some(kind) = self.in_flight {
            Phase::Requesting(kind)
        } else if self.cursor == self.states.len() {
            Phase::AllResolved
        } else if self.location_pending {
            Phase::AwaitingLocation
        } else {
            Phase::Idle
        };

        if phase != self.phase {
            self.phase = phase;
            if phase == Phase::AllResolved {
                info!(
                    "permission sheet resolved: {} granted, {} denied",
                    self.granted_count(),
                    self.states.len() - self.granted_count()
                );
            }
            self.emit(SheetEvent::Phase(phase));
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.emit(SheetEvent::Visibility(visible));
        }
    }

    fn granted_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_granted()).count()
    }

    fn emit(&mut self, event: SheetEvent) {
        self.observers
            .retain(|observer| observer.try_send(event).is_ok());
    }
}

/// A finished prompt always lands on a decision.
fn resolved(status: PermissionStatus) -> Authorization {
    match status.authorization() {
        Authorization::Unknown => Authorization::Denied,
        decided => decided,
    }
}

/// Receiver returned by [`PermissionSheet::subscribe`].
#[derive(Debug, Clone)]
pub struct SheetEvents {
    receiver: Receiver<SheetEvent>,
}

impl SheetEvents {
    /// Waits for the next change.
    pub async fn next(&self) -> Option<SheetEvent> {
        self.receiver.recv().await.ok()
    }

    /// Everything queued so far, without waiting.
    #[must_use]
    pub fn drain(&self) -> Vec<SheetEvent> {
        std::iter::from_fn(|| self.receiver.try_recv().ok()).collect()
    }
}

#[cfg(test)]
mod tests;
