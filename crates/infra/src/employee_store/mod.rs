//! Employee persistence: the store seam plus its in-memory and Postgres backends.

mod r#trait;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryEmployeeStore;
pub use postgres::PostgresStore;
pub use r#trait::EmployeeStore;
