pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use error::AppError;
pub use models::{Config, ContentSource};
pub use services::Pipeline;
