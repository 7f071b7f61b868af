use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_channel::bounded;
use permsheet_location::{AuthorizationDelegate, LocationBackend, LocationError, LocationResult};

use super::*;

type Answer = Result<PermissionStatus, PermissionError>;

#[derive(Debug, Default)]
struct ScriptedCatalog {
    statuses: Mutex<HashMap<PermissionKind, PermissionStatus>>,
    answers: Mutex<HashMap<PermissionKind, Answer>>,
    gate: Mutex<Option<Receiver<()>>>,
    requested: Mutex<Vec<PermissionKind>>,
    settings_opened: AtomicUsize,
}

impl ScriptedCatalog {
    fn with_status(self, kind: PermissionKind, status: PermissionStatus) -> Self {
        self.statuses.lock().unwrap().insert(kind, status);
        self
    }

    fn answering(self, kind: PermissionKind, answer: Answer) -> Self {
        self.answers.lock().unwrap().insert(kind, answer);
        self
    }

    fn gated(self, gate: Receiver<()>) -> Self {
        *self.gate.lock().unwrap() = Some(gate);
        self
    }

    fn requested(&self) -> Vec<PermissionKind> {
        self.requested.lock().unwrap().clone()
    }
}

impl PermissionBackend for ScriptedCatalog {
    fn check(&self, kind: PermissionKind) -> PermissionStatus {
        self.statuses
            .lock()
            .unwrap()
            .get(&kind)
            .copied()
            .unwrap_or(PermissionStatus::NotDetermined)
    }

    fn request(&self, kind: PermissionKind) -> BoxFuture<'static, Answer> {
        self.requested.lock().unwrap().push(kind);
        let answer = self
            .answers
            .lock()
            .unwrap()
            .remove(&kind)
            .unwrap_or(Ok(PermissionStatus::Granted));
        if let Ok(status) = &answer {
            self.statuses.lock().unwrap().insert(kind, *status);
        }
        let gate = self.gate.lock().unwrap().clone();

        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.recv().await;
            }
            answer
        })
    }

    fn open_settings(&self) -> Result<(), PermissionError> {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
        Err(PermissionError::NotSupported)
    }
}

/// Answers each location prompt synchronously with the next scripted status,
/// or with `fallback` once the script runs out.
#[derive(Default)]
struct ScriptedLocation {
    delegate: Mutex<Option<Arc<dyn AuthorizationDelegate>>>,
    replies: Mutex<VecDeque<LocationAuthorization>>,
    fallback: Option<LocationAuthorization>,
    /// Reported as soon as a delegate is registered, the way `CoreLocation` does.
    on_register: Option<LocationAuthorization>,
    fail: bool,
    requests: AtomicUsize,
}

impl fmt::Debug for ScriptedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedLocation").finish()
    }
}

impl ScriptedLocation {
    fn replying(replies: impl IntoIterator<Item = LocationAuthorization>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    fn emit(&self, status: LocationAuthorization) {
        let delegate = self.delegate.lock().unwrap().clone();
        delegate
            .expect("sheet registers a delegate")
            .on_authorization_changed(status);
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl LocationBackend for ScriptedLocation {
    fn authorization_status(&self) -> LocationAuthorization {
        LocationAuthorization::NotDetermined
    }

    fn set_delegate(&self, delegate: Arc<dyn AuthorizationDelegate>) {
        *self.delegate.lock().unwrap() = Some(delegate);
        if let Some(status) = self.on_register {
            self.emit(status);
        }
    }

    fn request_authorization(&self) -> LocationResult<()> {
        if self.fail {
            return Err(LocationError::NotSupported);
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front().or(self.fallback);
        if let Some(status) = reply {
            self.emit(status);
        }
        Ok(())
    }
}

fn no_delay() -> SheetConfig {
    SheetConfig::default().with_request_delay(Duration::ZERO)
}

fn new_sheet(
    kinds: &[PermissionKind],
    catalog: &Arc<ScriptedCatalog>,
    location: &Arc<ScriptedLocation>,
    config: SheetConfig,
) -> PermissionSheet {
    PermissionSheet::new(
        kinds.iter().copied(),
        catalog.clone(),
        LocationManager::new(location.clone()),
        config,
    )
}

fn assert_all_decided(sheet: &PermissionSheet) {
    assert!(
        sheet
            .states()
            .iter()
            .all(|state| state.authorization.is_resolved()),
        "undecided entries left: {:?}",
        sheet.states()
    );
}

#[test]
fn already_granted_sheet_is_never_shown() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_status(PermissionKind::Camera, PermissionStatus::Granted)
            .with_status(PermissionKind::Microphone, PermissionStatus::Granted),
    );
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[PermissionKind::Camera, PermissionKind::Microphone],
        &catalog,
        &location,
        no_delay(),
    );

    assert_eq!(sheet.cursor(), None);
    assert!(!sheet.is_visible());
    assert_eq!(sheet.phase(), Phase::AllResolved);
    assert!(sheet.is_all_granted());
    assert!(sheet.dismiss().is_ok());
}

#[test]
fn entries_are_sorted_and_deduplicated() {
    let catalog = Arc::new(
        ScriptedCatalog::default().with_status(PermissionKind::Camera, PermissionStatus::Granted),
    );
    let location = Arc::new(ScriptedLocation::default());
    let sheet = new_sheet(
        &[
            PermissionKind::Location,
            PermissionKind::Camera,
            PermissionKind::PhotoLibrary,
            PermissionKind::Camera,
        ],
        &catalog,
        &location,
        no_delay(),
    );

    let kinds: Vec<PermissionKind> = sheet.states().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PermissionKind::Camera,
            PermissionKind::PhotoLibrary,
            PermissionKind::Location
        ]
    );
    // camera is already granted, so the cursor starts on the photo library
    assert_eq!(sheet.cursor(), Some(1));
    assert!(sheet.is_visible());
    assert_eq!(sheet.phase(), Phase::Idle);
}

#[test]
fn restricted_seeds_as_denied() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_status(PermissionKind::PhotoLibrary, PermissionStatus::Restricted),
    );
    let location = Arc::new(ScriptedLocation::default());
    let sheet = new_sheet(&[PermissionKind::PhotoLibrary], &catalog, &location, no_delay());

    assert!(sheet.has_any_denial());
    assert!(sheet.is_visible());
    assert_eq!(sheet.cursor(), None);
}

#[tokio::test]
async fn camera_denial_blocks_dismiss() {
    let catalog = Arc::new(
        ScriptedCatalog::default().answering(PermissionKind::Camera, Ok(PermissionStatus::Denied)),
    );
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(&[PermissionKind::Camera], &catalog, &location, no_delay());
    assert_eq!(sheet.cursor(), Some(0));

    sheet.request_next().await;

    assert_eq!(catalog.requested(), vec![PermissionKind::Camera]);
    assert_eq!(
        sheet.state(PermissionKind::Camera).map(|s| s.authorization),
        Some(Authorization::Denied)
    );
    assert_eq!(sheet.cursor(), None);
    assert!(sheet.has_any_denial());
    assert!(!sheet.is_all_granted());
    assert!(matches!(
        sheet.dismiss(),
        Err(SheetError::NotAllGranted {
            denied: 1,
            pending: 0
        })
    ));
    assert!(sheet.is_visible());
}

#[tokio::test]
async fn prompts_follow_request_order() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[
            PermissionKind::PhotoLibrary,
            PermissionKind::Camera,
            PermissionKind::Microphone,
        ],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.request_next().await;

    assert_eq!(
        catalog.requested(),
        vec![
            PermissionKind::Camera,
            PermissionKind::Microphone,
            PermissionKind::PhotoLibrary
        ]
    );
    assert!(sheet.is_all_granted());
    assert!(sheet.dismiss().is_ok());
    assert!(!sheet.is_visible());
}

#[tokio::test]
async fn decided_entries_are_skipped() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .with_status(PermissionKind::Microphone, PermissionStatus::Granted),
    );
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[
            PermissionKind::Camera,
            PermissionKind::Microphone,
            PermissionKind::PhotoLibrary,
        ],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.request_next().await;

    assert_eq!(
        catalog.requested(),
        vec![PermissionKind::Camera, PermissionKind::PhotoLibrary]
    );
}

#[tokio::test]
async fn denial_does_not_stop_the_walk() {
    let catalog = Arc::new(
        ScriptedCatalog::default()
            .answering(PermissionKind::Camera, Ok(PermissionStatus::Denied))
            .answering(
                PermissionKind::Microphone,
                Err(PermissionError::Unknown("audio session busy".into())),
            ),
    );
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[
            PermissionKind::Camera,
            PermissionKind::Microphone,
            PermissionKind::PhotoLibrary,
        ],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.request_next().await;

    assert_eq!(catalog.requested().len(), 3);
    assert_all_decided(&sheet);
    let decisions: Vec<Authorization> = sheet.states().iter().map(|s| s.authorization).collect();
    assert_eq!(
        decisions,
        vec![
            Authorization::Denied,
            Authorization::Denied,
            Authorization::Granted
        ]
    );
}

#[tokio::test]
async fn undetermined_answer_counts_as_denied() {
    let catalog = Arc::new(ScriptedCatalog::default().answering(
        PermissionKind::Camera,
        Ok(PermissionStatus::NotDetermined),
    ));
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(&[PermissionKind::Camera], &catalog, &location, no_delay());

    sheet.request_next().await;

    assert_eq!(catalog.requested(), vec![PermissionKind::Camera]);
    assert!(sheet.has_any_denial());
    assert_all_decided(&sheet);
}

#[tokio::test]
async fn location_parks_until_notified() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[PermissionKind::Location, PermissionKind::Camera],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.request_next().await;

    assert_eq!(catalog.requested(), vec![PermissionKind::Camera]);
    assert_eq!(location.requests(), 1);
    assert_eq!(sheet.cursor(), Some(1));
    assert_eq!(sheet.phase(), Phase::AwaitingLocation);

    // a second call while the prompt is up does not raise another one
    sheet.request_next().await;
    assert_eq!(location.requests(), 1);

    sheet.on_location_status_changed(LocationAuthorization::AuthorizedWhenInUse);

    assert_eq!(sheet.cursor(), None);
    assert_eq!(sheet.phase(), Phase::AllResolved);
    assert!(sheet.is_all_granted());
}

#[tokio::test]
async fn run_resolves_location_through_notifications() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::replying([
        LocationAuthorization::NotDetermined,
        LocationAuthorization::Denied,
    ]));
    let mut sheet = new_sheet(
        &[PermissionKind::Camera, PermissionKind::Location],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.run().await;

    assert_eq!(location.requests(), 2);
    assert_all_decided(&sheet);
    assert_eq!(
        sheet.state(PermissionKind::Location).map(|s| s.authorization),
        Some(Authorization::Denied)
    );
    assert!(sheet.is_visible());
    assert!(sheet.has_any_denial());
}

#[tokio::test]
async fn repeated_undetermined_is_bounded() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation {
        fallback: Some(LocationAuthorization::NotDetermined),
        ..ScriptedLocation::default()
    });
    let mut sheet = new_sheet(
        &[PermissionKind::Location],
        &catalog,
        &location,
        no_delay().with_max_location_retries(2),
    );

    sheet.run().await;

    // the first prompt plus two re-requests
    assert_eq!(location.requests(), 3);
    assert_eq!(
        sheet.state(PermissionKind::Location).map(|s| s.authorization),
        Some(Authorization::Denied)
    );
    assert_eq!(sheet.phase(), Phase::AllResolved);
}

#[test]
fn undetermined_before_any_prompt_does_not_prompt() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[PermissionKind::Camera, PermissionKind::Location],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.on_location_status_changed(LocationAuthorization::NotDetermined);

    assert_eq!(location.requests(), 0);
    assert_eq!(sheet.cursor(), Some(0));
    assert_eq!(
        sheet.state(PermissionKind::Location).map(|s| s.authorization),
        Some(Authorization::Unknown)
    );
}

#[tokio::test]
async fn status_reported_at_registration_is_not_an_answer() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation {
        on_register: Some(LocationAuthorization::NotDetermined),
        ..ScriptedLocation::default()
    });
    let mut sheet = new_sheet(
        &[PermissionKind::Camera, PermissionKind::Location],
        &catalog,
        &location,
        no_delay(),
    );

    sheet.request_next().await;
    while let Some(status) = sheet.location_events.try_next() {
        sheet.on_location_status_changed(status);
    }

    assert_eq!(location.requests(), 1);
    assert_eq!(sheet.location_retries, 0);
    assert_eq!(sheet.phase(), Phase::AwaitingLocation);
}

#[tokio::test]
async fn registration_status_does_not_use_up_retries() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation {
        on_register: Some(LocationAuthorization::NotDetermined),
        ..ScriptedLocation::replying([LocationAuthorization::AuthorizedWhenInUse])
    });
    let mut sheet = new_sheet(
        &[PermissionKind::Location],
        &catalog,
        &location,
        no_delay().with_max_location_retries(0),
    );

    sheet.run().await;

    assert_eq!(location.requests(), 1);
    assert!(sheet.is_all_granted());
    assert!(sheet.dismiss().is_ok());
    assert!(!sheet.is_visible());
}

#[test]
fn location_denial_forces_the_sheet_back() {
    let catalog = Arc::new(
        ScriptedCatalog::default().with_status(PermissionKind::Location, PermissionStatus::Granted),
    );
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(&[PermissionKind::Location], &catalog, &location, no_delay());
    assert!(!sheet.is_visible());

    sheet.on_location_status_changed(LocationAuthorization::Restricted);

    assert!(sheet.is_visible());
    assert!(sheet.has_any_denial());
    assert!(sheet.dismiss().is_err());
}

#[test]
fn location_change_without_location_entry_is_ignored() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(&[PermissionKind::Camera], &catalog, &location, no_delay());

    sheet.on_location_status_changed(LocationAuthorization::Denied);

    assert!(!sheet.has_any_denial());
    assert_eq!(sheet.cursor(), Some(0));
}

#[tokio::test]
async fn unavailable_location_prompt_resolves_as_denied() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation {
        fail: true,
        ..ScriptedLocation::default()
    });
    let mut sheet = new_sheet(&[PermissionKind::Location], &catalog, &location, no_delay());

    sheet.run().await;

    assert!(sheet.has_any_denial());
    assert!(sheet.is_resolved());
}

#[tokio::test]
async fn location_notification_lands_while_camera_prompt_is_open() {
    let (release, gate) = bounded(1);
    let catalog = Arc::new(ScriptedCatalog::default().gated(gate));
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[PermissionKind::Camera, PermissionKind::Location],
        &catalog,
        &location,
        no_delay(),
    );

    let user = async {
        location.emit(LocationAuthorization::AuthorizedAlways);
        tokio::task::yield_now().await;
        release.send(()).await.unwrap();
    };
    futures::join!(sheet.request_next(), user);

    assert_eq!(catalog.requested(), vec![PermissionKind::Camera]);
    assert_eq!(location.requests(), 0);
    assert!(sheet.is_all_granted());
}

#[tokio::test]
async fn subscribers_see_the_walk() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(&[PermissionKind::Camera], &catalog, &location, no_delay());
    let events = sheet.subscribe();

    sheet.request_next().await;
    sheet.dismiss().unwrap();

    assert_eq!(
        events.drain(),
        vec![
            SheetEvent::Phase(Phase::Requesting(PermissionKind::Camera)),
            SheetEvent::Recorded(PermissionState::new(
                PermissionKind::Camera,
                Authorization::Granted
            )),
            SheetEvent::Phase(Phase::AllResolved),
            SheetEvent::Visibility(false),
        ]
    );
}

#[tokio::test]
async fn prompts_are_spaced_out() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let mut sheet = new_sheet(
        &[PermissionKind::Camera, PermissionKind::Microphone],
        &catalog,
        &location,
        SheetConfig::default().with_request_delay(Duration::from_millis(20)),
    );

    let started = std::time::Instant::now();
    sheet.request_next().await;

    assert!(started.elapsed() >= Duration::from_millis(20));
    assert!(sheet.is_all_granted());
}

#[test]
fn settings_failure_is_swallowed() {
    let catalog = Arc::new(ScriptedCatalog::default());
    let location = Arc::new(ScriptedLocation::default());
    let sheet = new_sheet(&[PermissionKind::Camera], &catalog, &location, no_delay());

    sheet.open_settings();

    assert_eq!(catalog.settings_opened.load(Ordering::SeqCst), 1);
}
