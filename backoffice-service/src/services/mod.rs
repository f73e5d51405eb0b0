pub mod database;
pub mod memory;
pub mod metrics;
pub mod records;
pub mod store;

pub use database::MongoStore;
pub use memory::InMemoryStore;
pub use records::Records;
pub use store::RecordStore;
