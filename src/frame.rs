// SPDX-License-Identifier: MPL-2.0

//! The display capability a frame payload may implement to support
//! [`vtm_config::SchedulerConfig::show`].

/// Implemented by a frame payload that knows how to render itself.
pub trait Displayable {
    /// Display this frame, waiting `delay_ms` afterward — mirrors the
    /// source's `frame.show(delay=...)`.
    fn display(&self, delay_ms: u64);
}
