pub mod detector;
pub mod models;
pub mod repository;
pub mod service;

pub use detector::*;
pub use models::*;
pub use repository::*;
pub use service::*;
