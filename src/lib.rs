pub mod api;
pub mod app;
pub mod config;
pub mod drafts;
pub mod error;
pub mod handlers;
pub mod insights;
pub mod markdown;
pub mod models;
pub mod notify;
pub mod poll;
pub mod report;
pub mod selection;
pub mod templates;
pub mod trace;

pub use app::{AppState, SharedAppState, create_app};
pub use config::Config;
pub use error::{AppError, AppResult};
