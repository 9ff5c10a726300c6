//! Server-side session persistence over a document database.
//!
//! A [`session::SessionStore`] resolves a session record from a
//! [`collection::DocumentCollection`] (or the identifier carried by a
//! [`cookie::CookieChannel`]), holds the session data in memory for the
//! duration of one request, and persists or destroys the record on demand.
//! Expired records are swept opportunistically via [`session::GcPolicy`].

pub mod collection;
pub mod config;
pub mod cookie;
pub mod error;
pub mod session;
pub mod util;

pub use collection::{Document, DocumentCollection, Filter, MemoryCollection};
pub use config::{Columns, SessionConfig};
pub use cookie::{CookieChannel, MemoryJar};
pub use error::{Result, SessionError};
pub use session::{GcPolicy, SessionStore, LAST_ACTIVE_KEY};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
