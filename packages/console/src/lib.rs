pub mod api;
pub mod config;
pub mod editor;
pub mod logging;
pub mod models;
pub mod shell;
pub mod store;
pub mod tui;

pub use api::{ApiError, ConsoleClient};
pub use config::Config;
pub use store::{ResourceStore, Settled, StoreError};
