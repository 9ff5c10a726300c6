mod gc;

pub use gc::GcPolicy;

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::collection::{Document, DocumentCollection, Filter};
use crate::config::SessionConfig;
use crate::cookie::CookieChannel;
use crate::error::{Result, SessionError};
use crate::util::unix_now;

/// Reserved key carrying the last-active timestamp inside session data.
pub const LAST_ACTIVE_KEY: &str = "last_active";

/// One activation of the session layer, scoped to a single request.
///
/// The store resolves a session record from the collection (or from the
/// identifier carried by the cookie channel), holds the session data in
/// memory while the request runs, and persists or destroys the record on
/// demand. Records are last-writer-wins: two activations updating the same
/// session concurrently can silently drop one update.
pub struct SessionStore<C, K> {
    collection: C,
    cookies: K,
    config: SessionConfig,
    /// Identifier the next write persists under.
    current_id: Option<String>,
    /// Identifier the stored record currently sits under, if any.
    persisted_id: Option<String>,
    data: HashMap<String, Value>,
}

impl<C: DocumentCollection, K: CookieChannel> SessionStore<C, K> {
    pub fn new(config: SessionConfig, collection: C, cookies: K) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            collection,
            cookies,
            config,
            current_id: None,
            persisted_id: None,
            data: HashMap::new(),
        })
    }

    /// The identifier the next write will persist under, if resolved yet.
    pub fn id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// The identifier the stored record currently sits under, if any.
    pub fn persisted_id(&self) -> Option<&str> {
        self.persisted_id.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// The full in-memory session mapping, reserved keys included.
    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Resolve session data for this activation.
    ///
    /// Looks up `id` (or, absent that, the value carried by the cookie)
    /// in the collection. On a hit the record's contents are loaded into
    /// the data map and `true` is returned. Otherwise a fresh identifier
    /// is generated, the map is initialized empty, and `false` is
    /// returned. Storage is never modified here.
    pub async fn read(&mut self, id: Option<&str>) -> Result<bool> {
        let candidate = match id {
            Some(id) => Some(id.to_string()),
            None => self.cookies.get(&self.config.name),
        };

        if let Some(candidate) = candidate {
            let filter = Filter::eq(&self.config.columns.session_id, &candidate);
            let found = self
                .collection
                .find_one(&filter)
                .await
                .map_err(SessionError::Read)?;
            if let Some(contents) = found
                .as_ref()
                .and_then(|doc| doc.get(&self.config.columns.contents))
                .and_then(Value::as_str)
            {
                self.data = serde_json::from_str(contents)?;
                self.current_id = Some(candidate.clone());
                self.persisted_id = Some(candidate);
                return Ok(true);
            }
        }

        self.regenerate().await?;
        self.data = HashMap::from([(LAST_ACTIVE_KEY.to_string(), Value::from(unix_now()))]);
        Ok(false)
    }

    /// Pick a fresh identifier, retrying until no record claims it.
    ///
    /// The token space dwarfs any live session count, but the collection
    /// is still consulted on every attempt rather than trusting the odds.
    /// Only the in-memory identifier moves; the stored record (if any) and
    /// the cookie are untouched until the next [`SessionStore::write`].
    pub async fn regenerate(&mut self) -> Result<String> {
        loop {
            let id = new_token();
            let filter = Filter::eq(&self.config.columns.session_id, &id);
            let taken = self
                .collection
                .find_one(&filter)
                .await
                .map_err(SessionError::Read)?;
            if taken.is_none() {
                debug!(id = %id, "generated session identifier");
                self.current_id = Some(id.clone());
                return Ok(id);
            }
        }
    }

    /// Persist the session mapping and refresh the cookie.
    ///
    /// Refreshes `last_active` to now, then inserts a new record or
    /// replaces the one under the previously persisted identifier. A
    /// rotated identifier commits in the same replace, so rotation is
    /// never observable as two records or a gap. On failure the persisted
    /// identifier is left untouched.
    pub async fn write(&mut self) -> Result<()> {
        let id = match self.current_id.clone() {
            Some(id) => id,
            None => self.regenerate().await?,
        };

        let now = unix_now();
        self.data
            .insert(LAST_ACTIVE_KEY.to_string(), Value::from(now));

        let columns = &self.config.columns;
        let mut doc = Document::new();
        doc.insert(columns.session_id.clone(), Value::from(id.clone()));
        doc.insert(columns.last_active.clone(), Value::from(now));
        doc.insert(
            columns.contents.clone(),
            Value::from(serde_json::to_string(&self.data)?),
        );

        match &self.persisted_id {
            None => self
                .collection
                .insert_one(doc)
                .await
                .map_err(SessionError::Write)?,
            Some(previous) => {
                let filter = Filter::eq(&columns.session_id, previous);
                self.collection
                    .replace_one(&filter, doc)
                    .await
                    .map_err(SessionError::Write)?;
            }
        }

        self.persisted_id = Some(id.clone());
        self.cookies
            .set(&self.config.name, &id, Duration::from_secs(self.config.lifetime));
        Ok(())
    }

    /// Delete the stored record (if any) and clear the cookie.
    ///
    /// A record already gone counts as success; so does a second destroy
    /// on the same handle.
    pub async fn destroy(&mut self) -> Result<()> {
        let Some(previous) = self.persisted_id.clone() else {
            return Ok(());
        };

        let filter = Filter::eq(&self.config.columns.session_id, &previous);
        self.collection
            .delete_one(&filter)
            .await
            .map_err(SessionError::Write)?;

        self.cookies.delete(&self.config.name);
        self.current_id = None;
        self.persisted_id = None;
        Ok(())
    }

    /// Identifier rotation with preserved contents is not implemented by
    /// this store; it fails fast and mutates nothing. Rotate with
    /// [`SessionStore::regenerate`] followed by a write instead.
    pub fn restart(&mut self) -> Result<()> {
        Err(SessionError::Unsupported("restart"))
    }

    /// Delete every record whose last-active timestamp fell behind the
    /// expiry threshold, in one bulk operation. Returns the number of
    /// records removed.
    pub async fn gc(&self) -> Result<u64> {
        let cutoff = unix_now() - self.config.expiry() as i64;
        let filter = Filter::lt(&self.config.columns.last_active, cutoff);
        let deleted = self
            .collection
            .delete_many(&filter)
            .await
            .map_err(SessionError::Maintenance)?;
        if deleted > 0 {
            debug!(deleted, "expired session records removed");
        }
        Ok(deleted)
    }

    /// Roll the policy's die and sweep when it fires. Returns whether the
    /// sweep ran. A rejected sweep is logged and swallowed; housekeeping
    /// never fails the request that triggered it.
    pub async fn maybe_gc<R: Rng + ?Sized>(&self, policy: &GcPolicy, rng: &mut R) -> bool {
        if !policy.should_run(rng) {
            return false;
        }
        if let Err(e) = self.gc().await {
            warn!("Failed to delete old session records: {}", e);
        }
        true
    }
}

/// Build an identifier token: epoch seconds, the sub-second microsecond
/// component, and 32 bits of entropy, all hex so the value is safe in the
/// identifier field and in a cookie.
fn new_token() -> String {
    let now = chrono::Utc::now();
    format!(
        "{:x}{:05x}-{:08x}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        rand::random::<u32>()
    )
}
