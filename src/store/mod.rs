//! Persistence layer: PostgreSQL via sqlx, one module per table family.

pub mod competitions;
pub mod db;
pub mod scans;
pub mod settings;
pub mod sources;
pub mod venues;

pub use db::Db;
