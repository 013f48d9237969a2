use std::env;

/// AppConfig
///
/// Holds the application's configuration. Immutable once loaded and shared with the
/// handlers and the guard middleware through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and the diagnostics default.
    pub env: Env,
    // Emit the `Navigating from .. to ..` record on allowed transitions.
    pub diagnostics_enabled: bool,
    // History base path the pages are mounted under. Always starts with '/', never ends with one
    // unless it is the root.
    pub base_url: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Which session store backs the guard.
    pub session_storage: SessionStorage,
}

/// Env
///
/// Defines the runtime context.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// SessionStorage
///
/// Selects the session store backend. `Disabled` simulates persistence being unavailable.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SessionStorage {
    Memory,
    Disabled,
}

impl Default for AppConfig {
    /// Safe values for test state scaffolding, no environment variables needed.
    fn default() -> Self {
        Self {
            env: Env::Local,
            diagnostics_enabled: true,
            base_url: "/".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            session_storage: SessionStorage::Memory,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics on values that cannot be interpreted (an unknown `SESSION_STORAGE` backend or a
    /// non-boolean `DIAGNOSTICS_ENABLED`) rather than starting with a guessed setting.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Diagnostics default on in local and off in production.
        let diagnostics_enabled = match env::var("DIAGNOSTICS_ENABLED") {
            Ok(raw) => parse_flag(&raw)
                .unwrap_or_else(|| panic!("FATAL: DIAGNOSTICS_ENABLED must be true or false, got `{raw}`.")),
            Err(_) => env == Env::Local,
        };

        let session_storage = match env::var("SESSION_STORAGE")
            .unwrap_or_else(|_| "memory".to_string())
            .as_str()
        {
            "memory" => SessionStorage::Memory,
            "disabled" => SessionStorage::Disabled,
            other => panic!("FATAL: SESSION_STORAGE must be `memory` or `disabled`, got `{other}`."),
        };

        Self {
            env,
            diagnostics_enabled,
            base_url: normalize_base(&env::var("BASE_URL").unwrap_or_else(|_| "/".to_string())),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_storage,
        }
    }

    /// Prefixes an in-app path with the base URL, for outgoing redirects.
    pub fn with_base(&self, path: &str) -> String {
        if self.base_url == "/" {
            return path.to_string();
        }
        match path {
            "/" => self.base_url.clone(),
            _ => format!("{}{}", self.base_url, path),
        }
    }

    /// Strips the base URL from an absolute path. Paths outside the base are returned as-is.
    pub fn strip_base<'a>(&self, path: &'a str) -> &'a str {
        if self.base_url == "/" {
            return path;
        }
        match path.strip_prefix(self.base_url.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Leading slash, no trailing slash, root stays `/`.
fn normalize_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}
