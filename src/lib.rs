pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notices;
pub mod session;
pub mod state;
pub mod stats;
pub mod ui;
pub mod validation;

pub use app::router;
pub use config::Settings;
pub use state::AppState;
