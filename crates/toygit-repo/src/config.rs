//! Repository configuration stored as TOML at `.toygit/config`.
//!
//! # Example
//!
//! ```toml
//! [core]
//! format_version = 1
//! default_branch = "main"
//! compression_level = 3
//! min_abbrev_len = 4
//!
//! [index]
//! lock_timeout_ms = 1000
//! lock_retry_ms = 25
//! stale_lock_secs = 600
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toygit_index::LockConfig;
use toygit_types::ObjectId;

use crate::error::{RepoError, RepoResult};
use crate::layout::write_atomic;
use crate::refs::validate_branch_name;

/// Complete repository configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    pub core: CoreConfig,
    pub index: IndexSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// On-disk format revision.
    pub format_version: u32,
    /// Branch `HEAD` names in a fresh repository.
    pub default_branch: String,
    /// zstd level for loose objects.
    pub compression_level: i32,
    /// Shortest abbreviated object id accepted.
    pub min_abbrev_len: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            format_version: RepoConfig::FORMAT_VERSION,
            default_branch: "main".into(),
            compression_level: 3,
            min_abbrev_len: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSettings {
    pub lock_timeout_ms: u64,
    pub lock_retry_ms: u64,
    pub stale_lock_secs: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        let lock = LockConfig::default();
        Self {
            lock_timeout_ms: lock.timeout.as_millis() as u64,
            lock_retry_ms: lock.retry_interval.as_millis() as u64,
            stale_lock_secs: lock.stale_after.as_secs(),
        }
    }
}

impl RepoConfig {
    pub const FORMAT_VERSION: u32 = 1;

    /// Shortest value allowed for `core.min_abbrev_len`.
    pub const MIN_ABBREV_LEN: usize = 4;

    /// Validate the configuration values.
    pub fn validate(&self) -> RepoResult<()> {
        let core = &self.core;
        if core.format_version != Self::FORMAT_VERSION {
            return Err(RepoError::Config(format!(
                "unsupported format_version {}",
                core.format_version
            )));
        }
        if !(Self::MIN_ABBREV_LEN..=ObjectId::HEX_LEN).contains(&core.min_abbrev_len) {
            return Err(RepoError::Config(format!(
                "min_abbrev_len must be between {} and {}, got {}",
                Self::MIN_ABBREV_LEN,
                ObjectId::HEX_LEN,
                core.min_abbrev_len
            )));
        }
        if !(1..=22).contains(&core.compression_level) {
            return Err(RepoError::Config(format!(
                "compression_level must be between 1 and 22, got {}",
                core.compression_level
            )));
        }
        validate_branch_name(&core.default_branch)
            .map_err(|reason| RepoError::Config(format!("default_branch: {reason}")))?;
        if self.index.lock_retry_ms == 0 {
            return Err(RepoError::Config("lock_retry_ms must be positive".into()));
        }
        Ok(())
    }

    /// Read and validate the file at `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> RepoResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(RepoError::at(path, e)),
        };
        let config: Self = toml::from_str(&contents)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration atomically.
    pub fn save(&self, path: &Path) -> RepoResult<()> {
        let text =
            toml::to_string_pretty(self).map_err(|e| RepoError::Config(e.to_string()))?;
        write_atomic(path, text.as_bytes()).map_err(|e| RepoError::at(path, e))
    }

    /// Index lock timing.
    pub fn lock_config(&self) -> LockConfig {
        LockConfig {
            timeout: Duration::from_millis(self.index.lock_timeout_ms),
            retry_interval: Duration::from_millis(self.index.lock_retry_ms),
            stale_after: Duration::from_secs(self.index.stale_lock_secs),
        }
    }
}
