pub mod database;
pub mod error;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use database::Database;
pub use error::StorageError;
pub use sqlite::SqliteStorage;
pub use traits::*;
