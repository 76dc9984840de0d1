//! Per-connection segmentation state.
//!
//! Session id policy:
//! - ids are issued in increasing order by [`SessionStore::open_session`]
//! - [`SessionStore::get_or_create`] adopts an id that was never issued and
//!   gives it fresh state
//! - an id that was issued and later closed is rejected with
//!   `SessionNotFound`; closed sessions are never resurrected
//! - once `SessionId::MAX` has been issued or adopted, no further ids are
//!   handed out and `open_session` fails with `SessionIdsExhausted`
//!
//! Each session is guarded by its own lock. Frames for one session must be
//! submitted one at a time; a second concurrent advance is rejected with
//! `ConcurrentAdvance` rather than queued, since reordering would corrupt
//! the hold and silence timers.

use crate::error::{Result, SignseqError};
use crate::segment::{
    Observation, OutputEvent, SegmentationSnapshot, Segmenter, SegmenterConfig,
};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, TryLockError};

pub type SessionId = u64;

/// Slot shared between the store and outstanding handles.
#[derive(Debug)]
struct SessionSlot {
    /// `None` once the session has been closed.
    segmenter: Mutex<Option<Segmenter>>,
}

/// Access to one session's state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    slot: Arc<SessionSlot>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Runs `f` with exclusive access to the session's segmenter.
    pub fn with_segmenter<R>(&self, f: impl FnOnce(&mut Segmenter) -> R) -> Result<R> {
        let mut guard = match self.slot.segmenter.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                return Err(SignseqError::ConcurrentAdvance { id: self.id });
            }
            Err(TryLockError::Poisoned(_)) => return Err(SignseqError::StorePoisoned),
        };

        match guard.as_mut() {
            Some(segmenter) => Ok(f(segmenter)),
            None => Err(SignseqError::SessionClosed { id: self.id }),
        }
    }

    /// Feeds one observation to this session.
    pub fn advance(&self, observation: &Observation) -> Result<OutputEvent> {
        self.with_segmenter(|segmenter| segmenter.process(observation))
    }

    /// Current state of this session.
    pub fn snapshot(&self) -> Result<SegmentationSnapshot> {
        self.with_segmenter(|segmenter| segmenter.state().snapshot())
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    sessions: HashMap<SessionId, Arc<SessionSlot>>,
    /// `None` once every id has been used.
    next_id: Option<SessionId>,
}

/// Owns one segmenter per active session.
#[derive(Debug)]
pub struct SessionStore {
    config: SegmenterConfig,
    inner: Mutex<StoreInner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

impl SessionStore {
    /// Creates a store whose sessions use `config`.
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                next_id: Some(1),
            }),
        }
    }

    fn inner(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| SignseqError::StorePoisoned)
    }

    fn new_slot(&self) -> Arc<SessionSlot> {
        Arc::new(SessionSlot {
            segmenter: Mutex::new(Some(Segmenter::with_config(self.config.clone()))),
        })
    }

    /// Opens a new session and returns its id.
    pub fn open_session(&self) -> Result<SessionId> {
        let mut inner = self.inner()?;
        let id = inner.next_id.ok_or(SignseqError::SessionIdsExhausted)?;
        if inner.sessions.contains_key(&id) {
            return Err(SignseqError::SessionIdsExhausted);
        }
        inner.next_id = id.checked_add(1);
        inner.sessions.insert(id, self.new_slot());
        info!("Session {} opened ({} active)", id, inner.sessions.len());
        Ok(id)
    }

    /// Returns the session `id`, adopting it if it was never issued.
    pub fn get_or_create(&self, id: SessionId) -> Result<SessionHandle> {
        let mut inner = self.inner()?;

        if let Some(slot) = inner.sessions.get(&id) {
            return Ok(SessionHandle {
                id,
                slot: Arc::clone(slot),
            });
        }
        // Every id below `next_id` has been handed out already.
        match inner.next_id {
            Some(next) if id >= next => {}
            _ => return Err(SignseqError::SessionNotFound { id }),
        }

        let slot = self.new_slot();
        inner.sessions.insert(id, Arc::clone(&slot));
        inner.next_id = id.checked_add(1);
        info!("Session {} adopted ({} active)", id, inner.sessions.len());
        Ok(SessionHandle { id, slot })
    }

    /// Returns the open session `id`.
    pub fn get(&self, id: SessionId) -> Result<SessionHandle> {
        let inner = self.inner()?;
        inner
            .sessions
            .get(&id)
            .map(|slot| SessionHandle {
                id,
                slot: Arc::clone(slot),
            })
            .ok_or(SignseqError::SessionNotFound { id })
    }

    /// Feeds one observation to the open session `id`.
    pub fn submit(&self, id: SessionId, observation: &Observation) -> Result<OutputEvent> {
        self.get(id)?.advance(observation)
    }

    /// Closes `id` and discards its state.
    ///
    /// Outstanding handles observe `SessionClosed` from then on.
    pub fn close(&self, id: SessionId) -> Result<()> {
        let slot = {
            let mut inner = self.inner()?;
            inner
                .sessions
                .remove(&id)
                .ok_or(SignseqError::SessionNotFound { id })?
        };

        // Blocks until an in-flight advance on this session finishes.
        let mut guard = slot
            .segmenter
            .lock()
            .map_err(|_| SignseqError::StorePoisoned)?;
        if let Some(segmenter) = guard.take() {
            info!(
                "Session {} closed with sequence {:?}",
                id,
                segmenter.state().sequence()
            );
        }
        Ok(())
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.inner().map_or(0, |inner| inner.sessions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }
}
