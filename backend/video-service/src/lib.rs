pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod service;

pub use config::Config;
pub use error::{AppError, RepositoryError, Result};
pub use repository::{RepositorySettings, VideoRepository};
pub use service::VideoHostingService;
