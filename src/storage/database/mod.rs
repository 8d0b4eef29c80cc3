//! Database storage implementation using SeaORM

/// Database entities module
pub mod entities;
/// Database migration module
pub mod migration;
/// SeaORM store implementation module
pub mod seaorm_store;

pub use migration::Migrator;
pub use seaorm_store::SeaOrmStore;
