//! In-memory session store with TTL eviction.
//!
//! This crate provides a process-wide table of sessions with:
//! - Opaque generated identifiers (see [`IdGenerator`])
//! - Payload snapshots on read, wholesale replacement on update
//! - TTL renewal on update only; reads never extend a session's life
//! - A background sweeper that evicts stale sessions on a fixed interval
//!
//! Eviction is bounded, not instantaneous: a session last updated at `t0`
//! disappears somewhere in `[t0 + max_age, t0 + max_age + sweep_interval]`.
//!
//! # Example
//!
//! ```rust,ignore
//! use lapse_session::{SessionStore, StoreConfig};
//!
//! let config = StoreConfig::default()
//!     .with_max_age(Duration::from_secs(300))
//!     .with_sweep_interval(Duration::from_secs(10));
//!
//! let store = SessionStore::new(config);
//! let id = store.create()?;
//! ```

mod config;
mod error;
mod id;
mod record;
mod store;
mod sweeper;

pub use config::{DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_AGE, DEFAULT_SWEEP_INTERVAL, StoreConfig};
pub use error::{Error, IdGenerationError, Result};
pub use id::{IdGenerator, RandomIdGenerator};
pub use record::{Payload, SessionRecord};
pub use store::{SessionEvent, SessionStore, StoreStats};
