// Browser session lifecycle for the scraping adapter.
//
// One live session per harvest: the first fetch launches it, later fetches
// in the same harvest reuse it, and the harvester's `release()` tears it
// down. The slot sits behind a tokio Mutex, so concurrent fetches take
// turns on the browser instead of sharing a page.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::sources::SourceError;

/// A live, exclusively-owned browser page.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url` and wait for the load event.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until an element matching `selector` exists. Returns false if
    /// `timeout` passes first.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Scroll to the bottom of the page to trigger lazy loading.
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// The current rendered DOM as HTML.
    async fn html(&mut self) -> Result<String>;

    /// Shut the browser down.
    async fn close(&mut self) -> Result<()>;
}

/// Creates browser sessions. Fails when the browser binary is missing or
/// the environment can't run it.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn RenderSession>>;
}

enum Slot {
    Empty,
    Live(Box<dyn RenderSession>),
    /// Launch already failed during this harvest; don't retry until release.
    Failed(String),
}

/// Owns at most one browser session at a time.
pub struct SessionManager {
    launcher: Box<dyn SessionLauncher>,
    slot: Mutex<Slot>,
}

impl SessionManager {
    pub fn new(launcher: Box<dyn SessionLauncher>) -> Self {
        Self {
            launcher,
            slot: Mutex::new(Slot::Empty),
        }
    }

    /// Get exclusive use of the session, launching it if needed.
    ///
    /// The returned guard must be handed back with `keep()` (session is
    /// healthy, reuse it) or `discard()` (close it now). Dropping the guard
    /// without either also drops the session.
    pub async fn acquire(&self) -> Result<SessionGuard<'_>, SourceError> {
        let mut slot = self.slot.lock().await;

        let session = match std::mem::replace(&mut *slot, Slot::Empty) {
            Slot::Live(session) => {
                debug!("Reusing browser session");
                session
            }
            Slot::Failed(reason) => {
                *slot = Slot::Failed(reason.clone());
                return Err(SourceError::Acquisition(reason));
            }
            Slot::Empty => match self.launcher.launch().await {
                Ok(session) => {
                    info!("Browser session started");
                    session
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    *slot = Slot::Failed(reason.clone());
                    return Err(SourceError::Acquisition(reason));
                }
            },
        };

        Ok(SessionGuard { slot, session })
    }

    /// Close the live session (if any) and forget any launch failure.
    pub async fn release(&self) {
        let mut slot = self.slot.lock().await;
        if let Slot::Live(mut session) = std::mem::replace(&mut *slot, Slot::Empty) {
            match session.close().await {
                Ok(()) => info!("Browser session closed"),
                Err(e) => warn!(error = %e, "Browser did not shut down cleanly"),
            }
        }
    }

    /// Whether a session is currently held open.
    pub async fn is_live(&self) -> bool {
        matches!(*self.slot.lock().await, Slot::Live(_))
    }
}

/// Exclusive access to the live session for the duration of one fetch.
pub struct SessionGuard<'a> {
    slot: MutexGuard<'a, Slot>,
    session: Box<dyn RenderSession>,
}

impl SessionGuard<'_> {
    pub fn session(&mut self) -> &mut dyn RenderSession {
        self.session.as_mut()
    }

    /// Put the session back for the next fetch.
    pub fn keep(self) {
        let SessionGuard { mut slot, session } = self;
        *slot = Slot::Live(session);
    }

    /// Close the session immediately; the next fetch launches a fresh one.
    pub async fn discard(self) {
        let SessionGuard { slot, mut session } = self;
        if let Err(e) = session.close().await {
            warn!(error = %e, "Browser did not shut down cleanly");
        }
        drop(slot);
    }
}
