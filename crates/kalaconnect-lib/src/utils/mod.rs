// Utility modules

pub mod database;
pub mod schema;

pub use database::{open_database, Database};
