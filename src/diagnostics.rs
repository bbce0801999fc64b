// SPDX-License-Identifier: MPL-2.0

//! Diagnostic emission gated by [`vtm_config::DebugLevel`], backed by
//! `tracing` rather than the source's hand-rolled `print` statements —
//! see the teacher's `init_logger` in `src/main.rs` for the same
//! substitution applied to its own diagnostics.

use vtm_config::DebugLevel;

pub(crate) fn info(level: DebugLevel, message: &str) {
    if level.allows(DebugLevel::Info) {
        tracing::info!("{message}");
    }
}

pub(crate) fn warn(level: DebugLevel, message: &str) {
    if level.allows(DebugLevel::Warnings) {
        tracing::warn!("{message}");
    }
}
