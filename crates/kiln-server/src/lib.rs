//! Watch controller and development server for kiln.
//!
//! The [`Dispatcher`] turns filesystem changes in the source tree into task
//! runs. The [`DevServer`] serves the output tree and tells connected
//! browsers to reload whenever it changes.

pub mod dispatch;
pub mod reload;
pub mod server;
pub mod watcher;

pub use dispatch::{watch_rules, Dispatcher, WatchRule};
pub use reload::{reload_client_script, ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{ChangeEvent, ChangeKind, ChangeSource, FileWatcher};
