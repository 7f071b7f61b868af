use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_channel::{Receiver, Sender, TryRecvError, unbounded};
use log::{debug, warn};

use crate::{AuthorizationDelegate, LocationAuthorization, LocationManager, LocationResult};

/// Queues every authorization change for [`AuthorizationEvents`] and then
/// hands it on to an optional forward delegate.
///
/// Only status transitions flow through here. The queue is unbounded so a
/// change reported from inside `set_delegate` waits until someone reads it.
struct ChannelAuthorizationDelegate {
    sender: Sender<LocationAuthorization>,
    forward: Mutex<Option<Arc<dyn AuthorizationDelegate>>>,
}

impl ChannelAuthorizationDelegate {
    fn new(sender: Sender<LocationAuthorization>) -> Self {
        Self {
            sender,
            forward: Mutex::new(None),
        }
    }

    fn set_forward_delegate(&self, delegate: Option<Arc<dyn AuthorizationDelegate>>) {
        let mut guard = self
            .forward
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = delegate;
    }
}

impl fmt::Debug for ChannelAuthorizationDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelAuthorizationDelegate").finish()
    }
}

impl AuthorizationDelegate for ChannelAuthorizationDelegate {
    fn on_authorization_changed(&self, status: LocationAuthorization) {
        debug!("location authorization changed to {status:?}");
        if let Err(err) = self.sender.try_send(status) {
            warn!("dropping location authorization change: {err}");
        }

        let forward = {
            let guard = self
                .forward
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };

        if let Some(delegate) = forward {
            delegate.on_authorization_changed(status);
        }
    }
}

/// Subscription to location authorization changes.
///
/// Owns the delegate slot of its [`LocationManager`]: creating a watcher
/// replaces whatever delegate was registered before. Use
/// [`set_forward_delegate`](Self::set_forward_delegate) to keep observing
/// changes elsewhere.
#[derive(Debug, Clone)]
pub struct AuthorizationWatcher {
    manager: LocationManager,
    delegate: Arc<ChannelAuthorizationDelegate>,
    events: AuthorizationEvents,
}

impl AuthorizationWatcher {
    /// Installs a channel-backed delegate on `manager`.
    #[must_use]
    pub fn new(manager: LocationManager) -> Self {
        let (sender, receiver) = unbounded();
        let delegate = Arc::new(ChannelAuthorizationDelegate::new(sender));
        manager.set_delegate(delegate.clone());

        Self {
            manager,
            delegate,
            events: AuthorizationEvents { receiver },
        }
    }

    /// The manager being watched.
    #[must_use]
    pub const fn manager(&self) -> &LocationManager {
        &self.manager
    }

    /// Current authorization, straight from the backend.
    #[must_use]
    pub fn status(&self) -> LocationAuthorization {
        self.manager.authorization_status()
    }

    /// Raises the location prompt. The answer arrives on [`events`](Self::events).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot raise the prompt.
    pub fn request(&self) -> LocationResult<()> {
        self.manager.request_authorization()
    }

    /// Stream of authorization changes.
    ///
    /// Handles share one queue, so each change is delivered to exactly one
    /// of them.
    #[must_use]
    pub fn events(&self) -> AuthorizationEvents {
        self.events.clone()
    }

    /// Sets a delegate that also sees every change.
    pub fn set_forward_delegate(&self, delegate: Arc<dyn AuthorizationDelegate>) {
        self.delegate.set_forward_delegate(Some(delegate));
    }

    /// Clears the forward delegate.
    pub fn clear_forward_delegate(&self) {
        self.delegate.set_forward_delegate(None);
    }
}

/// Receiving end of an [`AuthorizationWatcher`].
#[derive(Debug, Clone)]
pub struct AuthorizationEvents {
    receiver: Receiver<LocationAuthorization>,
}

impl AuthorizationEvents {
    /// Waits for the next change.
    ///
    /// Returns `None` once the watcher and its backend are gone.
    pub async fn next(&self) -> Option<LocationAuthorization> {
        self.receiver.recv().await.ok()
    }

    /// Takes a queued change without waiting.
    #[must_use]
    pub fn try_next(&self) -> Option<LocationAuthorization> {
        match self.receiver.try_recv() {
            Ok(status) => Some(status),
            Err(TryRecvError::Empty | TryRecvError::Closed) => None,
        }
    }

    /// Number of changes waiting to be consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
