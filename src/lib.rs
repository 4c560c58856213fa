pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod grading;
pub mod learning_service;
pub mod logging;
pub mod models;
pub mod progress;
pub mod recommendation;

pub use config::Config;
pub use database::Database;
pub use errors::*;
pub use learning_service::LearningService;
pub use models::*;
