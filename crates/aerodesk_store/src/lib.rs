pub mod memory;
pub mod seed;
pub mod sqlite;

pub use memory::{InMemoryLedger, InMemorySessionStore};
pub use seed::{seed_demo_data, SeedSummary};
pub use sqlite::SqliteStore;

#[cfg(test)]
mod tests;
