pub mod entities;
pub mod memory;
pub mod repository;
pub mod schema;
pub mod store;

pub use memory::MemoryStore;
pub use repository::LogbookRepository;
pub use schema::rebuild_database;
pub use store::LogbookStore;
