// SPDX-License-Identifier: MPL-2.0

//! Configuration for a `vtm::Scheduler`.
//!
//! Three options are recognized, matching the scheduler's construction
//! parameters: the sliding-window `buffer_size`, the `debug_level` that
//! gates diagnostic emission, and whether released frames should be
//! `show`n via the frame payload's display capability.

use std::{fs, io, path::Path};

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// Diagnostic verbosity, ordered least to most chatty.
///
/// Maps directly onto the source's `debug_level` integer (0..=4); kept as
/// an enum here so call sites can't pass an out-of-range level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum DebugLevel {
    /// No diagnostics at all.
    Silent,
    /// Fatal-adjacent conditions only.
    Errors,
    /// Errors and eviction/staleness warnings.
    #[default]
    Warnings,
    /// Warnings plus per-frame/per-task timing info.
    Info,
    /// Everything, including per-task-evaluation tracing.
    Verbose,
}

impl DebugLevel {
    /// Whether a diagnostic at `level` should be emitted given `self` as
    /// the configured threshold.
    #[must_use]
    pub fn allows(self, level: DebugLevel) -> bool {
        level <= self
    }
}

/// Scheduler construction options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Setters)]
#[serde(deny_unknown_fields, default)]
#[must_use]
pub struct SchedulerConfig {
    /// Sliding-window length, in frames, for both the data cache and the
    /// pending-task list. Must be positive.
    pub buffer_size: u32,
    /// Diagnostic verbosity.
    pub debug_level: DebugLevel,
    /// Whether released frames are displayed via the frame payload's
    /// display capability.
    pub show: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 10,
            debug_level: DebugLevel::Warnings,
            show: false,
        }
    }
}

/// Errors loading a [`SchedulerConfig`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

impl SchedulerConfig {
    /// Load a config from a RON file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse as a
    /// `SchedulerConfig`. Falling back to [`SchedulerConfig::default`] on
    /// error, if desired, is left to the caller.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            tracing::error!(path = %path.display(), %source, "failed to read config file");
            ConfigError::Read {
                path: path.display().to_string(),
                source,
            }
        })?;

        ron::from_str(&text).map_err(|source| {
            tracing::error!(path = %path.display(), %source, "failed to parse config file");
            ConfigError::Parse {
                path: path.display().to_string(),
                source,
            }
        })
    }

    /// Reject configurations that would make the scheduler useless, such
    /// as a zero-length window that evicts everything the instant it's
    /// produced.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.buffer_size == 0 {
            return Err("buffer_size must be positive");
        }
        Ok(())
    }
}
