use std::time::Duration;

use dashmap::DashMap;

/// Client-side token transport consumed by the session store.
///
/// HTTP hosts implement this over their cookie jar; the store only ever
/// gets, sets, or deletes one named value.
pub trait CookieChannel: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&self, name: &str, value: &str, lifetime: Duration);

    fn delete(&self, name: &str);
}

/// In-process cookie jar for tests and non-HTTP hosts.
#[derive(Debug, Default)]
pub struct MemoryJar {
    values: DashMap<String, String>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieChannel for MemoryJar {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).map(|v| v.clone())
    }

    fn set(&self, name: &str, value: &str, _lifetime: Duration) {
        self.values.insert(name.to_string(), value.to_string());
    }

    fn delete(&self, name: &str) {
        self.values.remove(name);
    }
}

impl<T: CookieChannel + ?Sized> CookieChannel for std::sync::Arc<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str, lifetime: Duration) {
        (**self).set(name, value, lifetime)
    }

    fn delete(&self, name: &str) {
        (**self).delete(name)
    }
}
