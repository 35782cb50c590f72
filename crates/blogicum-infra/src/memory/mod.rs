//! In-memory repositories - used when no database is configured, and as the
//! storage fixture for handler tests.

mod store;

pub use store::InMemoryStore;
