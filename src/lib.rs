pub mod app;
pub mod cell;
pub mod config;
pub mod dates;
pub mod errors;
pub mod export;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::load_data;
pub use store::{LocalStore, LogStore};
