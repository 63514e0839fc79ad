//! Server configuration read from the environment.

use std::path::PathBuf;

/// Selects the SQLite in-memory database instead of a file
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoachConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    /// Profiles kept in the LRU cache; 0 disables it
    pub profile_cache: usize,
    /// Replacement career table; `None` uses the built-in one
    pub roles_path: Option<PathBuf>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            db_path: "career_coach.db".to_string(),
            profile_cache: 256,
            roles_path: None,
        }
    }
}

impl CoachConfig {
    /// Read `HOST`, `PORT`, `COACH_DB_PATH`, `COACH_PROFILE_CACHE` and `COACH_ROLES_PATH`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys keep their
    /// defaults; unparseable numbers are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port),
            db_path: get("COACH_DB_PATH").unwrap_or(defaults.db_path),
            profile_cache: parse_or(
                "COACH_PROFILE_CACHE",
                get("COACH_PROFILE_CACHE"),
                defaults.profile_cache,
            ),
            roles_path: get("COACH_ROLES_PATH").map(PathBuf::from),
        }
    }

    pub fn uses_in_memory_db(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using {}", key, value, default);
            default
        }),
        None => default,
    }
}
