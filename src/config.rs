//! Environment-file configuration.
//!
//! [`Config::load`] reads a `KEY=VALUE` file (default `.development.env`)
//! into an immutable-after-load snapshot, then overlays the process
//! environment so real environment variables win over file values. The
//! loader never writes to the process environment; the snapshot is an
//! explicitly constructed value passed by reference to whoever needs it.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

/// Environment file read when `-f/--env-file` is not given.
pub const DEFAULT_ENV_FILE: &str = ".development.env";

/// Listening port used when `PORT` is absent or not a valid port number.
pub const DEFAULT_PORT: u16 = 3000;

/// Immutable-after-load key/value snapshot of the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load `path`, then overlay the process environment on top.
    ///
    /// A missing or unreadable file is not an error: the snapshot simply
    /// starts empty and lookups resolve to `None`.
    pub fn load(path: &Path) -> Self {
        Self::from_file(path).overlay(std::env::vars())
    }

    /// Parse only the environment file, without the process-env overlay.
    pub fn from_file(path: &Path) -> Self {
        let mut values = HashMap::new();
        match dotenvy::from_path_iter(path) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok((key, value)) => {
                            values.insert(key, value);
                        }
                        Err(e) => {
                            warn!(path = %path.display(), "skipping malformed env line: {e}");
                        }
                    }
                }
            }
            Err(e) => debug!(path = %path.display(), "env file not loaded: {e}"),
        }
        Self { values }
    }

    /// Overlay `vars` on top of the snapshot; later pairs win.
    ///
    /// Production code passes `std::env::vars()`. Tests pass explicit pairs
    /// instead of mutating the real process environment.
    pub fn overlay(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in vars {
            self.values.insert(key, value);
        }
        self
    }

    /// Look up a key. Absent keys resolve to `None`; never panics.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The listening port: `PORT` parsed as a port number, falling back to
    /// [`DEFAULT_PORT`] when the key is absent, non-numeric, or out of range.
    pub fn port(&self) -> u16 {
        self.get("PORT")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Number of keys in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
