//! Database models and queries

pub mod init;
pub mod lock;
pub mod models;
pub mod records;
pub mod series;
pub mod shifts;

pub use init::*;
pub use models::*;
