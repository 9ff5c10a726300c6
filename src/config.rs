use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fallback expiry when no session lifetime is configured: one month,
/// in seconds.
pub const ONE_MONTH_SECS: u64 = 30 * 24 * 3600;

/// Storage field names for session records.
///
/// Lets a deployment remap the three record fields onto whatever the
/// collection schema already uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub session_id: String,
    pub last_active: String,
    pub contents: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            session_id: "session_id".to_string(),
            last_active: "last_active".to_string(),
            contents: "contents".to_string(),
        }
    }
}

/// Configuration for a session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Database host the consuming backend should connect to.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Optional connection credentials.
    pub user: Option<String>,
    pub password: Option<String>,
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
    /// Name of the cookie carrying the session identifier.
    pub name: String,
    /// Garbage collection denominator: the sweep runs on average once
    /// every `gc + 1` activations.
    pub gc: u32,
    /// Session lifetime in seconds. Zero means "no explicit lifetime";
    /// expiry then falls back to [`ONE_MONTH_SECS`].
    pub lifetime: u64,
    /// Storage field name remapping.
    pub columns: Columns,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            user: None,
            password: None,
            database: "sessions".to_string(),
            collection: "sessions".to_string(),
            name: "session".to_string(),
            gc: 500,
            lifetime: 0,
            columns: Columns::default(),
        }
    }
}

impl SessionConfig {
    /// Check option values once, at store construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.is_empty() {
            return Err(ConfigError::Invalid("database name is empty".to_string()));
        }
        if self.collection.is_empty() {
            return Err(ConfigError::Invalid("collection name is empty".to_string()));
        }
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("cookie name is empty".to_string()));
        }
        let columns = &self.columns;
        if columns.session_id.is_empty()
            || columns.last_active.is_empty()
            || columns.contents.is_empty()
        {
            return Err(ConfigError::Invalid("column name is empty".to_string()));
        }
        Ok(())
    }

    /// Records idle for longer than this many seconds are expired.
    pub fn expiry(&self) -> u64 {
        if self.lifetime > 0 {
            self.lifetime
        } else {
            ONE_MONTH_SECS
        }
    }

    /// `host:port` target for the consuming backend's connection.
    pub fn connection_target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
