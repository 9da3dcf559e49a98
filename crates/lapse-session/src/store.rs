//! The session store: table, client operations and sweeper lifecycle.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::StoreConfig;
use crate::error::{Error, IdGenerationError, Result};
use crate::id::{IdGenerator, RandomIdGenerator};
use crate::record::{Payload, SessionRecord};
use crate::sweeper;

/// Notification emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was removed by a sweep pass.
    Evicted {
        /// The evicted session's ID.
        id: String,
        /// How long the session had gone without an update.
        idle: Duration,
        /// How long the session existed, from creation to eviction.
        lifetime: Duration,
    },
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Sessions currently in the table.
    pub live: usize,

    /// Sessions created since the store was built.
    pub created: u64,

    /// Successful updates since the store was built.
    pub updated: u64,

    /// Sessions evicted since the store was built.
    pub evicted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    created: AtomicU64,
    updated: AtomicU64,
    evicted: AtomicU64,
}

/// State shared between store handles and the sweeper task.
///
/// Every access to `table` goes through the one `RwLock`. Create, update
/// and sweep passes take the write side, so existence checks and
/// mutations are atomic with respect to eviction.
pub(crate) struct Shared {
    table: RwLock<HashMap<String, SessionRecord>>,
    config: StoreConfig,
    events: broadcast::Sender<SessionEvent>,
    counters: Counters,
}

impl Shared {
    pub(crate) fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Evict every record idle for at least `max_age`, under a single write lock.
    pub(crate) fn sweep(&self) -> usize {
        let max_age = self.config.max_age;
        let mut table = self.table.write();
        let now = Instant::now();
        let before = table.len();

        table.retain(|id, record| {
            if !record.is_expired(now, max_age) {
                return true;
            }
            let idle = record.idle(now);
            let lifetime = record.lifetime(now);
            debug!(
                session_id = %id,
                idle_ms = idle.as_millis() as u64,
                lifetime_ms = lifetime.as_millis() as u64,
                "Evicting expired session"
            );
            // No receivers is fine; lagging receivers drop old events.
            let _ = self.events.send(SessionEvent::Evicted {
                id: id.clone(),
                idle,
                lifetime,
            });
            false
        });

        let evicted = before - table.len();
        if evicted > 0 {
            self.counters
                .evicted
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, remaining = table.len(), "Sweep pass complete");
        }
        evicted
    }
}

/// Owns the sweeper task; cancelling happens when the last store handle goes.
struct SweeperHandle {
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Concurrent in-memory session store with TTL eviction.
///
/// Sessions are created with an empty payload, replaced wholesale by
/// [`update`](Self::update), and evicted by a background sweeper once they
/// have gone `max_age` without an update. Reads return copies and never
/// renew a session.
///
/// Handles are cheap to clone and share the same table. The sweeper stops
/// on [`shutdown`](Self::shutdown) or when the last handle is dropped.
pub struct SessionStore {
    shared: Arc<Shared>,
    generator: Arc<dyn IdGenerator>,
    sweeper: Arc<SweeperHandle>,
}

impl SessionStore {
    /// Create a store using [`RandomIdGenerator`] for session IDs.
    ///
    /// Must be called from within a Tokio runtime; the sweeper is spawned
    /// onto it.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_generator(config, RandomIdGenerator)
    }

    /// Create a store with a custom identifier generator.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_generator<G: IdGenerator>(config: StoreConfig, generator: G) -> Self {
        if config.sweep_interval >= config.max_age {
            warn!(
                max_age_ms = config.max_age.as_millis() as u64,
                sweep_interval_ms = config.sweep_interval.as_millis() as u64,
                "Sweep interval is not smaller than max age; eviction will lag"
            );
        }

        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Arc::new(Shared {
            table: RwLock::new(HashMap::new()),
            config,
            events,
            counters: Counters::default(),
        });

        let token = CancellationToken::new();
        let task = sweeper::spawn(Arc::clone(&shared), token.clone());

        Self {
            shared,
            generator: Arc::new(generator),
            sweeper: Arc::new(SweeperHandle {
                token,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// Create a new empty session and return its ID.
    ///
    /// Generator failures are returned as [`Error::IdGeneration`] without retry.
    /// An ID that collides with a live session is a generator failure too;
    /// the existing session is left untouched.
    pub fn create(&self) -> Result<String> {
        let id = self.generator.generate()?;

        let mut table = self.shared.table.write();
        match table.entry(id) {
            Entry::Occupied(entry) => {
                warn!(session_id = %entry.key(), "Generator returned an ID already in use");
                Err(IdGenerationError::new(format!(
                    "generated session ID collides with a live session: {}",
                    entry.key()
                ))
                .into())
            }
            Entry::Vacant(entry) => {
                let id = entry.key().clone();
                entry.insert(SessionRecord::new());
                self.shared.counters.created.fetch_add(1, Ordering::Relaxed);
                trace!(session_id = %id, live = table.len(), "Session created");
                Ok(id)
            }
        }
    }

    /// Get a snapshot of a session's payload.
    ///
    /// Does not renew the session. A session evicted an instant ago is
    /// reported as [`Error::NotFound`] like one that never existed.
    pub fn get(&self, id: &str) -> Result<Payload> {
        let table = self.shared.table.read();
        table
            .get(id)
            .map(|record| record.data().clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Replace a session's payload and renew its TTL.
    ///
    /// The existence check and the write happen under one write lock, so a
    /// concurrent sweep either evicts first (this returns
    /// [`Error::NotFound`]) or sees the refreshed timestamp.
    pub fn update(&self, id: &str, data: Payload) -> Result<()> {
        let mut table = self.shared.table.write();
        match table.get_mut(id) {
            Some(record) => {
                record.replace(data);
                self.shared.counters.updated.fetch_add(1, Ordering::Relaxed);
                trace!(session_id = %id, "Session updated");
                Ok(())
            }
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    /// Check whether a session is currently in the table.
    pub fn contains(&self, id: &str) -> bool {
        self.shared.table.read().contains_key(id)
    }

    /// Time since the session was last created or updated.
    pub fn idle_time(&self, id: &str) -> Result<Duration> {
        let table = self.shared.table.read();
        table
            .get(id)
            .map(|record| record.idle(Instant::now()))
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Get the current number of sessions.
    pub fn len(&self) -> usize {
        self.shared.table.read().len()
    }

    /// Check if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.shared.table.read().is_empty()
    }

    /// Run one eviction pass now and return the number of evicted sessions.
    ///
    /// Uses the same exclusive lock as the background sweeper.
    pub fn sweep_now(&self) -> usize {
        self.shared.sweep()
    }

    /// Subscribe to eviction events.
    ///
    /// Events are sent without blocking the sweep; a subscriber that falls
    /// more than `event_capacity` events behind loses the oldest ones.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        let counters = &self.shared.counters;
        StoreStats {
            live: self.len(),
            created: counters.created.load(Ordering::Relaxed),
            updated: counters.updated.load(Ordering::Relaxed),
            evicted: counters.evicted.load(Ordering::Relaxed),
        }
    }

    /// Stop the background sweeper. Idempotent.
    ///
    /// Sessions stay readable and writable afterwards; they just no longer expire.
    pub fn shutdown(&self) {
        if !self.sweeper.token.is_cancelled() {
            debug!("Shutting down session sweeper");
            self.sweeper.token.cancel();
        }
    }

    /// Stop the sweeper and wait for its task to exit.
    pub async fn shutdown_and_wait(&self) {
        self.shutdown();
        let task = self.sweeper.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            warn!(error = %e, "Session sweeper task ended abnormally");
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been requested.
    pub fn is_shut_down(&self) -> bool {
        self.sweeper.token.is_cancelled()
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            generator: Arc::clone(&self.generator),
            sweeper: Arc::clone(&self.sweeper),
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.shared.config)
            .field("live", &self.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
