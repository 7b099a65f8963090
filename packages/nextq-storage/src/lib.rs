pub mod cache;
pub mod db;
pub mod graph;
pub mod models;
pub mod queries;
pub mod schema;
pub mod suggestions;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
