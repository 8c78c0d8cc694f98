//! Construct-once cell for a transport server.
//!
//! The first caller starts the build and parks a shared handle to it in the
//! slot; concurrent callers await the same handle, so a single attempt yields
//! a single server (or a single error) for all of them. A failed attempt is
//! not cached: the slot returns to empty and the next caller starts over.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use uastack_types::security::TransportKind;
use uastack_types::UaError;
use uastack_wire::EndpointServer;

use crate::error::{AppError, AppResult};

pub type BuildResult = Result<Arc<dyn EndpointServer>, Arc<UaError>>;
pub type BuildFuture = BoxFuture<'static, BuildResult>;

enum SlotState {
    Empty,
    Pending {
        attempt: u64,
        build: Shared<BuildFuture>,
    },
    Ready(Arc<dyn EndpointServer>),
}

struct Inner {
    state: SlotState,
    next_attempt: u64,
}

pub struct ServerSlot {
    kind: TransportKind,
    inner: Mutex<Inner>,
}

impl ServerSlot {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(Inner {
                state: SlotState::Empty,
                next_attempt: 0,
            }),
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// The current server, if one has been built and not closed.
    pub fn get(&self) -> Option<Arc<dyn EndpointServer>> {
        match &self.lock().state {
            SlotState::Ready(server) => Some(Arc::clone(server)),
            _ => None,
        }
    }

    /// Return the server, building it with `build` when the slot is empty.
    ///
    /// `build` is called at most once per attempt, under the slot's lock, and
    /// must only create the future; the future itself runs outside the lock.
    pub async fn get_or_create<F>(&self, build: F) -> AppResult<Arc<dyn EndpointServer>>
    where
        F: FnOnce() -> BuildFuture,
    {
        let (attempt, pending) = {
            let mut inner = self.lock();
            match &inner.state {
                SlotState::Ready(server) => return Ok(Arc::clone(server)),
                SlotState::Pending { attempt, build } => (*attempt, build.clone()),
                SlotState::Empty => {
                    let attempt = inner.next_attempt;
                    inner.next_attempt += 1;
                    let shared = build().shared();
                    inner.state = SlotState::Pending {
                        attempt,
                        build: shared.clone(),
                    };
                    debug!(scheme = self.kind.scheme(), attempt, "Server construction started");
                    (attempt, shared)
                }
            }
        };

        let result = pending.await;

        let mut inner = self.lock();
        let current = match &inner.state {
            SlotState::Pending { attempt: a, .. } => *a == attempt,
            SlotState::Ready(server) => match &result {
                Ok(built) => Arc::ptr_eq(server, built),
                Err(_) => false,
            },
            SlotState::Empty => false,
        };

        match result {
            Ok(server) if current => {
                if !matches!(inner.state, SlotState::Ready(_)) {
                    info!(
                        scheme = self.kind.scheme(),
                        local_addr = %server.local_addr(),
                        "Endpoint server ready"
                    );
                    inner.state = SlotState::Ready(Arc::clone(&server));
                }
                Ok(server)
            }
            Ok(server) => {
                // The slot was closed while this attempt was running.
                drop(inner);
                warn!(scheme = self.kind.scheme(), attempt, "Closing server built after close()");
                server.close();
                Err(AppError::Closed(self.kind.scheme()))
            }
            Err(source) => {
                if current {
                    inner.state = SlotState::Empty;
                }
                warn!(scheme = self.kind.scheme(), attempt, error = %source, "Server construction failed");
                Err(AppError::ServerConstruction {
                    scheme: self.kind.scheme(),
                    source,
                })
            }
        }
    }

    /// Close and forget the current server. Returns whether one was closed.
    ///
    /// An attempt still in flight is abandoned; its server is closed by the
    /// callers awaiting it once it finishes.
    pub fn close(&self) -> bool {
        let previous = std::mem::replace(&mut self.lock().state, SlotState::Empty);
        match previous {
            SlotState::Ready(server) => {
                server.close();
                true
            }
            SlotState::Pending { attempt, .. } => {
                debug!(scheme = self.kind.scheme(), attempt, "Abandoning server construction");
                false
            }
            SlotState::Empty => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ServerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.lock().state {
            SlotState::Empty => "empty",
            SlotState::Pending { .. } => "pending",
            SlotState::Ready(_) => "ready",
        };
        f.debug_struct("ServerSlot")
            .field("kind", &self.kind)
            .field("state", &state)
            .finish()
    }
}
