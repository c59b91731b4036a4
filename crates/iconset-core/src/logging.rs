//! Logging facilities for iconset.
//!
//! iconset uses the `tracing` crate for instrumentation. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Each subsystem logs under its own target, listed in [`targets`], so a
//! directive such as `iconset::loader=debug` narrows output to manifest loading.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "iconset_core::signal";
    /// Icon state changes and playback.
    pub const ICON: &str = "iconset::icon";
    /// Manifest parsing and icon resolution.
    pub const LOADER: &str = "iconset::loader";
    /// Directory and archive byte sources.
    pub const SOURCE: &str = "iconset::source";
    /// Bundle registration and lookup.
    pub const REGISTRY: &str = "iconset::registry";
}
