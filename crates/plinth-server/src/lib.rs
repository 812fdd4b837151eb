//! Development server with live reload for plinth sites.
//!
//! Serves the built output tree, watches the source trees, and pushes a
//! reload signal to connected browsers once the triggered rebuild settles.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{ReloadHub, ReloadMessage};
