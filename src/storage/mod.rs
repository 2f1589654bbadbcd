// storage/mod.rs
// Database operations module

pub mod insert;
pub mod load;
pub mod pool;
pub mod schema;

// Re-export commonly used items
pub use insert::{persist_snapshot, read_metadata};
pub use load::load_snapshot;
pub use pool::init_db_pool_with_path;
pub use schema::create_tables;
