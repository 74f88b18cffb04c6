// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `src` / `exclude` glob patterns per asset class.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Holding the watch-phase resources (watcher, dev server, reload hub).
//!
//! It does **not** know about the task graph; it only turns filesystem
//! changes into class-level `SourceChanged` events.

pub mod patterns;
pub mod session;
pub mod watcher;

pub use patterns::{ClassWatchProfile, build_class_profiles, collect_matching_files, rel_string};
pub use session::WatchSession;
pub use watcher::{WatcherHandle, spawn_watcher};
