pub mod app;
pub mod categories;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod custom_fields;
pub mod desk;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod keys;
pub mod logger;
pub mod models;
pub mod state;
pub mod stats;
pub mod stopwatch;
pub mod storage;
pub mod summary;
pub mod ui;
pub mod undo;

pub use app::router;
pub use config::Config;
pub use desk::Desk;
pub use errors::{DeskError, Result};
pub use state::AppState;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
