use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key holding the opaque session credential.
pub const TOKEN_KEY: &str = "token";
/// Key holding the session expiry as decimal epoch milliseconds.
pub const TOKEN_EXPIRY_KEY: &str = "tokenExpiry";
/// Key holding the full path to resume after login.
pub const REDIRECT_TO_KEY: &str = "redirectTo";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session storage is unavailable")]
    Unavailable,
    #[error("session storage lock was poisoned")]
    Poisoned,
}

// 1. SessionStore Contract
/// SessionStore
///
/// Synchronous, string-keyed key/value store holding the session credential and the
/// pending redirect. The guard, the login-completion handler and the logout handler all
/// receive it as an injected capability, so the backend can be swapped for an in-memory
/// fake in tests or a disabled store when persistence is unavailable.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), SessionStoreError>;
}

// 2. In-Memory Implementation
/// InMemorySessionStore
///
/// Process-wide store used by the server and by tests. Last writer wins.
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let entries = self.entries.lock().map_err(|_| SessionStoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().map_err(|_| SessionStoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut entries = self.entries.lock().map_err(|_| SessionStoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// 3. Disabled Implementation
/// DisabledSessionStore
///
/// Stands in for persistence that is switched off. Every operation fails, which makes the
/// guard treat the session as absent.
#[derive(Clone, Copy, Default)]
pub struct DisabledSessionStore;

impl SessionStore for DisabledSessionStore {
    fn get(&self, _key: &str) -> Result<Option<String>, SessionStoreError> {
        Err(SessionStoreError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable)
    }
}

/// SessionStoreState
///
/// The concrete type used to share the session store across the application state.
pub type SessionStoreState = Arc<dyn SessionStore>;

// 4. Session Snapshot
/// SessionState
///
/// Snapshot of the session fields read by the guard at decision time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub token: Option<String>,
    /// Absolute expiry in epoch milliseconds. `None` when absent or without leading digits.
    pub token_expiry: Option<i64>,
}

impl SessionState {
    /// load
    ///
    /// Reads the session from the store. An empty token is treated as absent, and an expiry
    /// without a leading integer is treated as missing. If the store cannot be read,
    /// the session is reported as absent.
    pub fn load(store: &dyn SessionStore) -> Self {
        let token = match store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|value| !value.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Session storage unreadable, treating session as absent");
                return Self::default();
            }
        };

        let token_expiry = match store.get(TOKEN_EXPIRY_KEY) {
            Ok(raw) => raw.and_then(|value| parse_expiry(&value)),
            Err(e) => {
                tracing::warn!(error = %e, "Session expiry unreadable, ignoring it");
                None
            }
        };

        Self {
            token,
            token_expiry,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// A session is expired only when both a token and an expiry are present and the
    /// expiry lies strictly before `now_ms`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.has_token() && self.token_expiry.is_some_and(|expiry| now_ms > expiry)
    }
}

/// parse_expiry
///
/// Reads the leading integer of the stored value: an optional sign followed by digits, up to
/// the first non-digit. `"1699999940000.0"` reads as `1699999940000`. Values with no leading
/// digits are ignored. Out-of-range values saturate.
fn parse_expiry(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];

    if digits.is_empty() {
        tracing::debug!(raw, "Ignoring malformed token expiry");
        return None;
    }

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

// 5. Session Mutations
/// Persists a freshly issued session. A missing expiry removes any stale one.
pub fn store_session(
    store: &dyn SessionStore,
    token: &str,
    expires_at: Option<i64>,
) -> Result<(), SessionStoreError> {
    store.set(TOKEN_KEY, token)?;
    match expires_at {
        Some(expiry) => store.set(TOKEN_EXPIRY_KEY, &expiry.to_string()),
        None => store.remove(TOKEN_EXPIRY_KEY),
    }
}

/// Removes the token and its expiry.
pub fn clear_session(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    store.remove(TOKEN_KEY)?;
    store.remove(TOKEN_EXPIRY_KEY)
}

pub fn stash_redirect(store: &dyn SessionStore, full_path: &str) -> Result<(), SessionStoreError> {
    store.set(REDIRECT_TO_KEY, full_path)
}

/// take_pending_redirect
///
/// Reads and clears the stashed destination. Used once login completes.
pub fn take_pending_redirect(store: &dyn SessionStore) -> Result<Option<String>, SessionStoreError> {
    let pending = store.get(REDIRECT_TO_KEY)?;
    if pending.is_some() {
        store.remove(REDIRECT_TO_KEY)?;
    }
    Ok(pending.filter(|path| !path.is_empty()))
}
