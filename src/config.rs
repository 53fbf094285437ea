use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

use crate::state::lookup::CachePolicy;

/// Runtime settings, read from `SLIDESHOW_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Location of the SQLite slide catalog
    pub db_path: PathBuf,
    pub cache_policy: CachePolicy,
    /// Wrap from the last slide to the first (and back)
    pub wrap_around: bool,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("SLIDESHOW_DB") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => Self::default_db_path(),
        };

        Self {
            db_path,
            cache_policy: try_load(&lookup, "SLIDESHOW_CACHE", CachePolicy::default()),
            wrap_around: try_load(&lookup, "SLIDESHOW_WRAP", false),
        }
    }

    /// Where the catalog lives when nothing else is configured:
    /// - Linux: ~/.local/share/slideshow/slideshow.db
    /// - macOS: ~/Library/Application Support/slideshow/slideshow.db
    /// - Windows: %APPDATA%\slideshow\slideshow.db
    pub fn default_db_path() -> PathBuf {
        match dirs::data_dir().or_else(dirs::home_dir) {
            Some(mut path) => {
                path.push("slideshow");
                path.push("slideshow.db");
                path
            }
            None => {
                warn!("Could not determine user data directory, using working directory");
                PathBuf::from("slideshow.db")
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.cache_policy, CachePolicy::Versioned);
        assert!(!config.wrap_around);
        assert!(config.db_path.ends_with("slideshow.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SLIDESHOW_DB", "/tmp/show.db"),
            ("SLIDESHOW_CACHE", "persistent"),
            ("SLIDESHOW_WRAP", "true"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/show.db"));
        assert_eq!(config.cache_policy, CachePolicy::Persistent);
        assert!(config.wrap_around);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_from(&[("SLIDESHOW_CACHE", "lru"), ("SLIDESHOW_WRAP", "sometimes")]);
        assert_eq!(config.cache_policy, CachePolicy::Versioned);
        assert!(!config.wrap_around);
    }
}
