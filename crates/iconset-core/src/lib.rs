//! Core primitives for iconset.
//!
//! This crate provides the pieces the rest of the workspace builds on:
//!
//! - **Signal/Slot System**: Type-safe observer notifications ([`Signal`])
//! - **Logging**: Tracing target names for each subsystem ([`logging`])
//!
//! # Signal/Slot Example
//!
//! ```
//! use iconset_core::Signal;
//!
//! let frame_changed = Signal::<usize>::new();
//!
//! let conn_id = frame_changed.connect(|frame| {
//!     println!("Now showing frame {}", frame);
//! });
//!
//! frame_changed.emit(3);
//! frame_changed.disconnect(conn_id);
//! ```

pub mod logging;
mod signal;

pub use signal::{ConnectionId, Signal};
