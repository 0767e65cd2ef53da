pub mod memory;
pub mod postgres;

pub use linkway_core::repository::{Link, ReadRepository, Repository};
pub use linkway_core::StorageError;
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
