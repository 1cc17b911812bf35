pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::BoardError;
