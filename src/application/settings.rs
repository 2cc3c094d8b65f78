// ============================================================
// Layer 2 — Settings
// ============================================================
// Root directories used by every workflow:
//
//   config/  ← db/sp.yml, analysis.yml
//   data/    ← raw corpora, relative `dir` entries resolve here
//   db/      ← JSON document collections
//
// Each can be moved with an environment variable:
//   RNNVIS_CONFIG_DIR, RNNVIS_DATA_DIR, RNNVIS_DB_DIR
//
// Why environment variables and not flags?
//   The three roots rarely change between runs, and the same
//   values are shared by every method. Setting them once in the
//   shell keeps the command line down to the method name.
//
// Empty variables count as unset.
//
// Reference: Rust Book §12.5 (Working with Environment Variables)

use std::path::PathBuf;

pub const CONFIG_DIR_VAR: &str = "RNNVIS_CONFIG_DIR";
pub const DATA_DIR_VAR:   &str = "RNNVIS_DATA_DIR";
pub const DB_DIR_VAR:     &str = "RNNVIS_DB_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub data_dir:   PathBuf,
    pub db_dir:     PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            data_dir:   PathBuf::from("data"),
            db_dir:     PathBuf::from("db"),
        }
    }
}

impl Settings {
    /// Defaults, overridden by any of the environment variables that are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let dir = |var: &str, fallback: PathBuf| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback)
        };
        Self {
            config_dir: dir(CONFIG_DIR_VAR, defaults.config_dir),
            data_dir:   dir(DATA_DIR_VAR, defaults.data_dir),
            db_dir:     dir(DB_DIR_VAR, defaults.db_dir),
        }
    }

    /// `config/db/sp.yml`
    pub fn seed_config(&self) -> PathBuf {
        self.config_dir.join("db").join("sp.yml")
    }

    /// `config/analysis.yml`
    pub fn analysis_config(&self) -> PathBuf {
        self.config_dir.join("analysis.yml")
    }
}
